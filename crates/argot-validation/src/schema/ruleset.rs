// Compiled rule table and path-matching engine

use crate::path::{Path, Segment};
use crate::tag::Tag;
use indexmap::IndexMap;

/// Key and value tags registered at one schema path
#[derive(Debug, Clone, Default)]
pub struct Rule {
    /// Structural tags of the key (`Required`, `Optional`)
    pub key: Vec<Tag>,

    /// Value constraints; a value passes if any one of them validates
    pub value: Vec<Tag>,
}

impl Rule {
    pub fn is_required(&self) -> bool {
        self.key.iter().any(Tag::is_required)
    }

    pub fn is_optional(&self) -> bool {
        self.key.iter().any(Tag::is_optional)
    }
}

/// Path-indexed rule table compiled from a schema.
///
/// Rules keep insertion order: when several rule paths match a concrete path,
/// [`lookup`](Ruleset::lookup) returns the first one registered. A ruleset is
/// never modified after compilation and can be shared between threads.
#[derive(Debug, Clone, Default)]
pub struct Ruleset {
    rules: IndexMap<Path, Rule>,
}

impl Ruleset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key tag at `path`.
    ///
    /// The entry is created even when `tag` is `None`, so an untagged schema
    /// key still makes its path permitted.
    pub fn add_key_tag(&mut self, path: Path, tag: Option<Tag>) {
        let rule = self.rules.entry(path).or_default();
        if let Some(tag) = tag {
            rule.key.push(tag);
        }
    }

    /// Record a value tag at `path`.
    pub fn add_value_tag(&mut self, path: Path, tag: Tag) {
        self.rules.entry(path).or_default().value.push(tag);
    }

    /// Length-exact, per-segment match of a rule path against a concrete one.
    pub fn match_path(rule_path: &Path, concrete: &Path) -> bool {
        rule_path.matches(concrete)
    }

    /// Does any rule path match `path`? The root is never permitted.
    pub fn permit(&self, path: &Path) -> bool {
        !path.is_empty() && self.rules.keys().any(|rule_path| rule_path.matches(path))
    }

    /// The first rule (in table order) whose path matches `path`.
    pub fn lookup(&self, path: &Path) -> Option<&Rule> {
        self.rules
            .iter()
            .find(|(rule_path, _)| rule_path.matches(path))
            .map(|(_, rule)| rule)
    }

    /// Distinct segments that follow `prefix` in longer rule paths.
    pub fn subkeys(&self, prefix: &Path) -> Vec<Segment> {
        let mut segments: Vec<Segment> = Vec::new();
        for rule_path in self.rules.keys().filter(|p| p.extends(prefix)) {
            let next = &rule_path.segments()[prefix.len()];
            if !segments.contains(next) {
                segments.push(next.clone());
            }
        }
        segments
    }

    /// Must `path` be present in a document?
    ///
    /// True for a `Required` key with no parent rule (a top-level field), or
    /// a `Required` key directly under an `Optional` one. A `Required` key
    /// under any other parent is not reported as required.
    pub fn required(&self, path: &Path) -> bool {
        let Some(rule) = self.lookup(path) else {
            return false;
        };
        match self.lookup(&path.parent()) {
            None => rule.is_required(),
            Some(parent) => parent.is_optional() && rule.is_required(),
        }
    }

    /// Every rule path, in table order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.rules.keys()
    }

    /// Every rule, in table order.
    pub fn rules(&self) -> impl Iterator<Item = (&Path, &Rule)> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
