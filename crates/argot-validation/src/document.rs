//! The pruned document tree built during validation.
//!
//! Nodes keep their raw scalar text, quoting style, tag and anchor: they are
//! not interpreted until materialization, which is where the type allow-list
//! is enforced.

use argot_yaml::{Location, ScalarStyle};

/// One node of a validated document
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,

    /// Resolved tag string, if the source carried one
    pub tag: Option<String>,

    /// Anchor id (`0` = none)
    pub anchor: usize,

    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Scalar { value: String, style: ScalarStyle },
    Sequence(Vec<Node>),
    /// Key/value pairs in document order
    Mapping(Vec<(Node, Node)>),
    /// Reference back to an anchored node
    Alias(usize),
}

impl Node {
    pub fn new(kind: NodeKind, tag: Option<String>, anchor: usize, location: Location) -> Self {
        Self {
            kind,
            tag,
            anchor,
            location,
        }
    }

    /// Raw text of a scalar node.
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Look up a mapping entry by the raw text of its key.
    pub fn get(&self, key: &str) -> Option<&Node> {
        match &self.kind {
            NodeKind::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Number of children of a container (0 for scalars and aliases).
    pub fn len(&self) -> usize {
        match &self.kind {
            NodeKind::Sequence(items) => items.len(),
            NodeKind::Mapping(entries) => entries.len(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Scalar { .. } => "scalar",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Alias(_) => "alias",
        }
    }
}
