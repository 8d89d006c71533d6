//! Lookup table from fully-qualified tag strings to tag kinds.

use crate::tag::TagKind;
use std::collections::HashMap;

/// Namespace URI the default vocabulary registers under.
pub const DEFAULT_NAMESPACE: &str = "tag:argot.packfiles.io,2024";

/// Resolves tag strings found in a schema to [`TagKind`]s.
///
/// Each kind is registered under `"<namespace>:<alias>"` for every one of its
/// aliases, using the namespace the registry was created with. A registry is
/// built once and then passed by reference to schema compilation.
///
/// # Example
///
/// ```rust
/// use argot_validation::{TagKind, TagRegistry};
///
/// let tags = TagRegistry::with_defaults();
/// assert_eq!(tags.resolve("tag:argot.packfiles.io,2024:rg"), Some(TagKind::Range));
/// assert_eq!(tags.resolve("!rg"), Some(TagKind::Range));
/// assert_eq!(tags.resolve("!nope"), None);
/// ```
#[derive(Debug, Clone)]
pub struct TagRegistry {
    namespace: String,
    tags: HashMap<String, TagKind>,
}

impl TagRegistry {
    /// Create an empty registry for `namespace`.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            tags: HashMap::new(),
        }
    }

    /// The default namespace with the full vocabulary registered.
    pub fn with_defaults() -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE)
    }

    /// A custom namespace with the full vocabulary registered.
    pub fn with_namespace(namespace: impl Into<String>) -> Self {
        let mut registry = Self::new(namespace);
        for kind in TagKind::ALL {
            registry.register(kind);
        }
        registry
    }

    /// Register every alias of `kind` under this registry's namespace.
    pub fn register(&mut self, kind: TagKind) {
        for alias in kind.aliases() {
            self.tags.insert(self.qualify(alias), kind);
        }
    }

    /// Resolve a tag string.
    ///
    /// Accepts the fully-qualified form, or the local shorthand `!alias`
    /// which is read as `<namespace>:alias`. Unknown tags resolve to `None`.
    pub fn resolve(&self, tag: &str) -> Option<TagKind> {
        if let Some(kind) = self.tags.get(tag) {
            return Some(*kind);
        }

        let alias = tag.strip_prefix('!').filter(|rest| !rest.starts_with('!'))?;
        self.tags.get(&self.qualify(alias)).copied()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Every registered fully-qualified tag.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.keys().map(|s| s.as_str())
    }

    fn qualify(&self, alias: &str) -> String {
        format!("{}:{}", self.namespace, alias)
    }
}

impl Default for TagRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
