// Error types for schema compilation and document loading

use argot_yaml::Location;
use thiserror::Error;

/// A tag could not be configured from the schema node it annotates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
    /// Pattern source is not a valid regular expression
    #[error("Invalid regular expression '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    /// Range text is not `A..B`, `A...B`, `A-B` or `A to B`
    #[error("Invalid range '{0}' (expected 'A..B', 'A...B', 'A-B' or 'A to B')")]
    InvalidRange(String),

    /// Unknown type name for the `type` tag
    #[error(
        "Unknown type name '{0}' (expected string, integer, float, array, hash, map or boolean)"
    )]
    UnknownType(String),

    /// A scalar-configured tag was attached to a mapping or sequence
    #[error("The '{tag}' tag needs a scalar value")]
    ExpectedScalar { tag: &'static str },

    /// The `oneof` tag was attached to something other than a sequence
    #[error("The '{tag}' tag needs a sequence of alternatives")]
    ExpectedAlternatives { tag: &'static str },
}

/// Errors that prevent a schema from compiling into a ruleset
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    /// Malformed YAML or a broken event stream
    #[error("Schema could not be read: {0}")]
    Yaml(#[from] argot_yaml::Error),

    /// A recognized tag rejected its configuration value
    #[error("{source} (line {}, column {})", .location.start_line, .location.start_column)]
    Tag { source: TagError, location: Location },

    /// A tag was attached to a position it does not annotate
    #[error(
        "The '{tag}' tag cannot annotate a {position} (line {}, column {})",
        .location.start_line,
        .location.start_column
    )]
    MisplacedTag {
        tag: &'static str,
        position: &'static str,
        location: Location,
    },

    /// The schema source holds no document
    #[error("Schema document is empty")]
    Empty,
}

/// Errors raised while loading a document into native values.
///
/// Schema violations are never reported here; they are [`Annotation`]s.
/// These variants stop the load outright.
///
/// [`Annotation`]: crate::Annotation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoadError {
    /// Malformed YAML or a broken event stream
    #[error(transparent)]
    Yaml(#[from] argot_yaml::Error),

    /// The document asked for a type outside the permitted set
    #[error(
        "Tried to load unspecified type '{tag}' (line {}, column {})",
        .location.start_line,
        .location.start_column
    )]
    MaliciousInput { tag: String, location: Location },

    /// The document uses an alias but aliases were not allowed
    #[error(
        "Alias parsing was not enabled; to enable it, set allow_aliases (line {}, column {})",
        .location.start_line,
        .location.start_column
    )]
    AliasesNotEnabled { location: Location },

    /// An alias refers to an anchor that has not been materialized
    #[error(
        "Alias refers to an unknown anchor (line {}, column {})",
        .location.start_line,
        .location.start_column
    )]
    UnknownAnchor { location: Location },

    /// A core tag was applied to a node it cannot describe (e.g. `!!int abc`)
    #[error(
        "Cannot read '{value}' as {tag} (line {}, column {})",
        .location.start_line,
        .location.start_column
    )]
    InvalidScalar {
        tag: String,
        value: String,
        location: Location,
    },

    /// The document nests deeper than the configured limit
    #[error("Nesting depth exceeds maximum of {max_depth}")]
    NestingTooDeep { max_depth: usize },
}

impl LoadError {
    /// True for refusals of a disallowed type.
    pub fn is_malicious(&self) -> bool {
        matches!(self, LoadError::MaliciousInput { .. })
    }
}
