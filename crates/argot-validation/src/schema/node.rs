// Annotated schema tree

use crate::path::Path;
use crate::tag::Tag;
use argot_yaml::{Location, Scalar};

/// One construct of a schema document
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub value: SchemaValue,

    /// Configured tag, if the node carried a recognized one
    pub tag: Option<Tag>,

    pub location: Location,

    /// Path from the schema root to this node
    pub path: Path,
}

/// Contents of a [`SchemaNode`]
#[derive(Debug, Clone)]
pub enum SchemaValue {
    /// A scalar, tokenized, along with its source text
    Scalar { value: Scalar, raw: String },
    Sequence(Vec<SchemaNode>),
    /// Key/value pairs in document order
    Mapping(Vec<(SchemaNode, SchemaNode)>),
}

impl SchemaNode {
    /// Is this node's tag a `Pattern`?
    pub fn is_pattern(&self) -> bool {
        matches!(self.tag, Some(Tag::Pattern(_)))
    }

    pub fn is_one_of(&self) -> bool {
        matches!(self.tag, Some(Tag::OneOf))
    }

    /// Look up a mapping entry by its key's scalar text.
    pub fn get(&self, key: &str) -> Option<&SchemaNode> {
        match &self.value {
            SchemaValue::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| matches!(&k.value, SchemaValue::Scalar { raw, .. } if raw == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }
}
