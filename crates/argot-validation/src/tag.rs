//! The tag vocabulary.
//!
//! A schema attaches tags to keys and values with YAML's own tag syntax:
//!
//! ```yaml
//! !r farmer_name: !x "^Farmer [A-Z][a-z]+$"
//! farmer_level: !rg "1-5"
//! ```
//!
//! [`TagKind`] is a tag as resolved from the registry, before it has seen
//! the node it annotates. [`TagKind::configure`] compiles the node's literal
//! value into a [`Tag`], which carries everything needed to validate.

use crate::error::TagError;
use crate::schema::SchemaValue;
use argot_yaml::Scalar;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A\s*(\d+)\s*(\.\.\.?|-|to)\s*(\d+)\s*\z").unwrap());

/// Syntactic positions a tag may annotate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Key,
    Value,
    KeyOrValue,
}

impl Position {
    pub fn accepts_key(self) -> bool {
        matches!(self, Position::Key | Position::KeyOrValue)
    }

    pub fn accepts_value(self) -> bool {
        matches!(self, Position::Value | Position::KeyOrValue)
    }
}

/// An unconfigured tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Required,
    Optional,
    Type,
    Range,
    Pattern,
    Literal,
    OneOf,
}

impl TagKind {
    pub const ALL: [TagKind; 7] = [
        TagKind::Required,
        TagKind::Optional,
        TagKind::Type,
        TagKind::Range,
        TagKind::Pattern,
        TagKind::Literal,
        TagKind::OneOf,
    ];

    /// Long name, used in messages.
    pub fn name(self) -> &'static str {
        self.aliases()[0]
    }

    /// Every short name this kind registers under.
    pub fn aliases(self) -> &'static [&'static str] {
        match self {
            TagKind::Required => &["required", "r"],
            TagKind::Optional => &["optional", "o"],
            TagKind::Type => &["type", "t"],
            TagKind::Range => &["range", "rg"],
            TagKind::Pattern => &["rexpr", "x"],
            TagKind::Literal => &["literal", "l"],
            TagKind::OneOf => &["oneof", "one"],
        }
    }

    pub fn applies_to(self) -> Position {
        match self {
            TagKind::Required | TagKind::Optional => Position::Key,
            TagKind::Pattern => Position::KeyOrValue,
            TagKind::Type | TagKind::Range | TagKind::Literal | TagKind::OneOf => Position::Value,
        }
    }

    /// Compile this kind's parameters from the annotated node's value.
    pub fn configure(self, value: &SchemaValue) -> Result<Tag, TagError> {
        match self {
            TagKind::Required => Ok(Tag::Required),
            TagKind::Optional => Ok(Tag::Optional),
            TagKind::Type => {
                let text = self.scalar_text(value)?;
                TypeName::parse(&text)
                    .map(Tag::Type)
                    .ok_or(TagError::UnknownType(text))
            }
            TagKind::Range => {
                let text = self.scalar_text(value)?;
                Bound::parse(&text).map(Tag::Range)
            }
            TagKind::Pattern => {
                let text = self.scalar_text(value)?;
                Regex::new(&text)
                    .map(Tag::Pattern)
                    .map_err(|err| TagError::InvalidPattern {
                        pattern: text,
                        message: err.to_string(),
                    })
            }
            TagKind::Literal => match value {
                SchemaValue::Scalar { value, .. } => Ok(Tag::Literal(value.clone())),
                _ => Err(TagError::ExpectedScalar { tag: self.name() }),
            },
            TagKind::OneOf => match value {
                SchemaValue::Sequence(_) => Ok(Tag::OneOf),
                _ => Err(TagError::ExpectedAlternatives { tag: self.name() }),
            },
        }
    }

    /// Source text of a scalar argument, as written in the schema
    fn scalar_text(self, value: &SchemaValue) -> Result<String, TagError> {
        match value {
            SchemaValue::Scalar { raw, .. } => Ok(raw.clone()),
            _ => Err(TagError::ExpectedScalar { tag: self.name() }),
        }
    }
}

impl fmt::Display for TagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Runtime types the `type` tag can demand
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeName {
    String,
    Integer,
    Float,
    Array,
    Hash,
    Boolean,
}

impl TypeName {
    /// Case-insensitive; `map` is a synonym for `hash`.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "string" => Some(TypeName::String),
            "integer" => Some(TypeName::Integer),
            "float" => Some(TypeName::Float),
            "array" => Some(TypeName::Array),
            "hash" | "map" => Some(TypeName::Hash),
            "boolean" => Some(TypeName::Boolean),
            _ => None,
        }
    }

    fn describe(self) -> &'static str {
        match self {
            TypeName::String => "String",
            TypeName::Integer => "Integer",
            TypeName::Float => "Float",
            TypeName::Array => "Array",
            TypeName::Hash => "Hash",
            TypeName::Boolean => "Boolean",
        }
    }

    fn admits(self, value: &Scalar) -> bool {
        matches!(
            (self, value),
            (TypeName::String, Scalar::String(_))
                | (TypeName::Integer, Scalar::Integer(_))
                | (TypeName::Float, Scalar::Float(_))
                | (TypeName::Boolean, Scalar::Bool(_))
        )
    }
}

/// Integer bounds of the `range` tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bound {
    pub start: u64,
    pub end: u64,
    pub exclusive: bool,
}

impl Bound {
    /// Parse `A..B`, `A-B` or `A to B` (inclusive) and `A...B` (exclusive).
    pub fn parse(text: &str) -> Result<Self, TagError> {
        let invalid = || TagError::InvalidRange(text.to_string());
        let caps = RANGE.captures(text).ok_or_else(invalid)?;

        let start = caps[1].parse().map_err(|_| invalid())?;
        let end = caps[3].parse().map_err(|_| invalid())?;
        Ok(Self {
            start,
            end,
            exclusive: &caps[2] == "...",
        })
    }

    /// Largest integer inside the bound.
    pub fn max(&self) -> u64 {
        if self.exclusive {
            self.end.saturating_sub(1)
        } else {
            self.end
        }
    }

    pub fn covers(&self, value: f64) -> bool {
        let (start, end) = (self.start as f64, self.end as f64);
        if self.exclusive {
            start <= value && value < end
        } else {
            start <= value && value <= end
        }
    }
}

/// A configured tag
#[derive(Debug, Clone)]
pub enum Tag {
    Required,
    Optional,
    Type(TypeName),
    Range(Bound),
    Pattern(Regex),
    Literal(Scalar),
    /// Alternatives are the children of the annotated sequence
    OneOf,
}

impl Tag {
    pub fn kind(&self) -> TagKind {
        match self {
            Tag::Required => TagKind::Required,
            Tag::Optional => TagKind::Optional,
            Tag::Type(_) => TagKind::Type,
            Tag::Range(_) => TagKind::Range,
            Tag::Pattern(_) => TagKind::Pattern,
            Tag::Literal(_) => TagKind::Literal,
            Tag::OneOf => TagKind::OneOf,
        }
    }

    /// Does `value` satisfy this tag?
    ///
    /// Structural tags (`Required`, `Optional`, `OneOf`) accept every value.
    pub fn validate(&self, value: &Scalar) -> bool {
        match self {
            Tag::Required | Tag::Optional | Tag::OneOf => true,
            Tag::Type(name) => name.admits(value),
            Tag::Range(bound) => value.as_f64().is_some_and(|v| bound.covers(v)),
            Tag::Pattern(regex) => value.as_str().is_some_and(|s| regex.is_match(s)),
            Tag::Literal(expected) => value == expected,
        }
    }

    /// Human-readable description of an acceptable value.
    pub fn expectation(&self) -> Option<String> {
        match self {
            Tag::Required | Tag::Optional | Tag::OneOf => None,
            Tag::Type(name) => Some(name.describe().to_string()),
            Tag::Range(bound) => Some(format!(
                "a value between {} and {}",
                bound.start,
                bound.max()
            )),
            Tag::Pattern(regex) => Some(format!(
                "a match for the regular expression '{}'",
                regex.as_str()
            )),
            Tag::Literal(expected) => Some(format!("'{}'", expected)),
        }
    }

    pub fn is_required(&self) -> bool {
        matches!(self, Tag::Required)
    }

    pub fn is_optional(&self) -> bool {
        matches!(self, Tag::Optional)
    }
}
