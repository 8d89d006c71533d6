//! # argot-validation
//!
//! Tag-driven YAML schema validation and restricted loading.
//!
//! A schema is a plain YAML document whose keys and values carry tags from a
//! [`TagRegistry`] (`!r`/required, `!o`/optional, `!t`/type, `!rg`/range,
//! `!x`/pattern, `!l`/literal, `!one`/oneof). It compiles into a [`Ruleset`],
//! which is immutable and can be shared between threads.
//!
//! Documents are validated in a single streaming pass: every key and value is
//! checked as it is read, and only the parts the ruleset permits are kept.
//! Violations come back as [`Annotation`]s, never as errors. The surviving
//! tree can then be materialized into [`Value`]s under an allow-list of
//! types, refusing anything else as malicious input.
//!
//! ## Example
//!
//! ```rust
//! use argot_validation::{load, validate, Level, LoadOptions, Ruleset, TagRegistry};
//!
//! let schema = r#"
//! !r farmer_name: !x "^Farmer [A-Z][a-z]+$"
//! good_number: !rg "1-100"
//! "#;
//! let ruleset = Ruleset::compile(schema, &TagRegistry::default()).unwrap();
//!
//! let validation = validate(&ruleset, "farmer_name: Farmer Brown\ngood_number: 9001\n", "farm.yml").unwrap();
//! assert_eq!(validation.annotations().len(), 1);
//! assert_eq!(validation.annotations()[0].level(), Level::Failure);
//!
//! let loaded = load(&ruleset, "farmer_name: Farmer Brown\n", "farm.yml", &LoadOptions::default()).unwrap();
//! assert!(loaded.value.is_some());
//! ```

mod annotation;
mod document;
mod error;
mod load;
mod materialize;
mod path;
mod registry;
pub mod schema;
mod tag;
mod validator;

pub use annotation::{Annotation, Level};
pub use document::{Node, NodeKind};
pub use error::{LoadError, SchemaError, TagError};
pub use load::{load, Loaded};
pub use materialize::{materialize, LoadOptions, Value, CORE_TAG_PREFIX};
pub use path::{Path, Segment};
pub use registry::{TagRegistry, DEFAULT_NAMESPACE};
pub use schema::{Rule, Ruleset, SchemaNode, SchemaRegistry, SchemaValue};
pub use tag::{Bound, Position, Tag, TagKind, TypeName};
pub use validator::{validate, Validation, Validator};
