//! Schema compilation.
//!
//! A schema is an ordinary YAML document whose keys and values carry tags:
//!
//! ```yaml
//! !r farmer_name: !x "^Farmer [A-Z][a-z]+$"
//! good_number: !rg "1-100"
//! farm:
//!   !o goat_zone:
//!     !r pasture_uuid: !t string
//! ```
//!
//! It is read into a [`SchemaNode`] tree, then compiled into a [`Ruleset`]:
//! a table from (possibly wildcarded) paths to key and value rules. The
//! tree is only an intermediate; rulesets are what validation runs against.

pub mod builder;
pub mod compiler;
mod node;
mod ruleset;

pub use node::{SchemaNode, SchemaValue};
pub use ruleset::{Rule, Ruleset};

use crate::error::SchemaError;
use crate::registry::TagRegistry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

impl Ruleset {
    /// Parse and compile a schema document.
    ///
    /// # Example
    ///
    /// ```rust
    /// use argot_validation::{Path, Ruleset, TagRegistry};
    ///
    /// let ruleset = Ruleset::compile("!r title: !t string", &TagRegistry::with_defaults()).unwrap();
    /// let title: Path = ["title"].into_iter().collect();
    /// assert!(ruleset.permit(&title));
    /// assert!(ruleset.required(&title));
    /// ```
    pub fn compile(source: &str, tags: &TagRegistry) -> Result<Ruleset, SchemaError> {
        let tree = builder::parse(source, tags)?;
        let mut ruleset = Ruleset::new();
        compiler::compile(&tree, &mut ruleset);
        debug!(rules = ruleset.len(), "compiled schema");
        Ok(ruleset)
    }
}

/// Compiled rulesets stored by id.
///
/// [`get`](SchemaRegistry::get) hands out a shared, read-only [`Arc`]; the
/// stored ruleset is never copied.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tags: TagRegistry,
    schemas: HashMap<String, Arc<Ruleset>>,
}

impl SchemaRegistry {
    /// Create a registry that compiles schemas with `tags`.
    pub fn new(tags: TagRegistry) -> Self {
        Self {
            tags,
            schemas: HashMap::new(),
        }
    }

    /// Compile `source` and store it under `id`, replacing any previous entry.
    pub fn register(&mut self, id: impl Into<String>, source: &str) -> Result<(), SchemaError> {
        let ruleset = Ruleset::compile(source, &self.tags)?;
        self.insert(id, ruleset);
        Ok(())
    }

    /// Store an already-compiled ruleset.
    pub fn insert(&mut self, id: impl Into<String>, ruleset: Ruleset) {
        self.schemas.insert(id.into(), Arc::new(ruleset));
    }

    pub fn get(&self, id: &str) -> Option<Arc<Ruleset>> {
        self.schemas.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    /// Registered schema ids (in arbitrary order)
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(|s| s.as_str())
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }
}
