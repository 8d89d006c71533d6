// Validate-then-materialize entry point

use crate::annotation::Annotation;
use crate::error::LoadError;
use crate::materialize::{materialize, LoadOptions, Value};
use crate::schema::Ruleset;
use crate::validator::{Validation, Validator};
use tracing::debug;

/// Outcome of [`load`]: the materialized value (or the fallback) and every
/// annotation produced while validating.
#[derive(Debug, Clone)]
pub struct Loaded {
    pub value: Option<Value>,
    pub annotations: Vec<Annotation>,
}

impl Loaded {
    /// True when validation produced no warnings or failures.
    pub fn is_valid(&self) -> bool {
        !self.annotations.iter().any(Annotation::is_error)
    }
}

impl Validation {
    /// Convert the pruned tree into native values.
    ///
    /// Returns the configured fallback when validation found errors (unless
    /// `ignore_validation_errors` is set) or when the document had no
    /// materializable root.
    pub fn materialize(&self, options: &LoadOptions) -> Result<Option<Value>, LoadError> {
        if self.has_errors() && !options.ignore_validation_errors {
            return Ok(options.fallback.clone());
        }
        match self.root() {
            Some(root) => materialize(root, options).map(Some),
            None => Ok(options.fallback.clone()),
        }
    }
}

/// Validate `source` against `ruleset`, then materialize what survived.
///
/// # Example
///
/// ```rust
/// use argot_validation::{load, LoadOptions, Ruleset, TagRegistry};
///
/// let ruleset = Ruleset::compile("!r name: !t string", &TagRegistry::default()).unwrap();
/// let loaded = load(&ruleset, "name: Ada", "input", &LoadOptions::default()).unwrap();
/// assert!(loaded.is_valid());
/// assert_eq!(loaded.value.unwrap().get("name").and_then(|v| v.as_str()), Some("Ada"));
/// ```
pub fn load(
    ruleset: &Ruleset,
    source: &str,
    label: &str,
    options: &LoadOptions,
) -> Result<Loaded, LoadError> {
    let validation = Validator::parse_and_validate(ruleset, source, label)?;
    let value = validation.materialize(options)?;
    debug!(
        label,
        materialized = value.is_some(),
        annotations = validation.annotations().len(),
        "loaded document"
    );
    Ok(Loaded {
        value,
        annotations: validation.into_annotations(),
    })
}
