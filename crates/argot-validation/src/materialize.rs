//! Conversion of a validated document tree into native values.
//!
//! Materialization runs under an allow-list. Plain scalars and the YAML core
//! tags (`!!str`, `!!int`, `!!float`, `!!bool`, `!!null`, `!!seq`, `!!map`)
//! are always available. Any other tag is a request to construct a type,
//! and is honoured only when [`LoadOptions::permitted_types`] names it.
//! Everything else fails with [`LoadError::MaliciousInput`].
//!
//! # Depth Limiting
//!
//! Materialization enforces a maximum depth to prevent stack overflow from
//! deeply nested documents. The default limit is 256 levels.

use crate::document::{Node, NodeKind};
use crate::error::LoadError;
use argot_yaml::{Location, Scalar, ScalarScanner, ScalarStyle};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use tracing::warn;

/// Prefix of the YAML core schema tags (what `!!` expands to)
pub const CORE_TAG_PREFIX: &str = "tag:yaml.org,2002:";

const CORE_TAGS: [&str; 7] = ["str", "int", "float", "bool", "null", "seq", "map"];

/// A materialized value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(String),
    Sequence(Vec<Value>),
    /// Key/value pairs in document order
    Mapping(Vec<(Value, Value)>),
    /// A node built under a permitted non-core tag
    Tagged { tag: String, value: Box<Value> },
}

impl Value {
    /// Look up a mapping entry by string or symbol key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Mapping(entries) => entries
                .iter()
                .find(|(k, _)| k.as_str() == Some(key))
                .map(|(_, v)| v),
            Value::Tagged { value, .. } => value.get(key),
            _ => None,
        }
    }

    /// Text of a string or symbol.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Render a mapping key as a JSON object key.
    fn key_string(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => Scalar::Float(*f).to_string(),
            Value::String(s) | Value::Symbol(s) => s.clone(),
            Value::Tagged { value, .. } => value.key_string(),
            Value::Sequence(_) | Value::Mapping(_) => {
                serde_json::to_string(self).unwrap_or_default()
            }
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Null => Value::Null,
            Scalar::Bool(b) => Value::Bool(b),
            Scalar::Integer(i) => Value::Integer(i),
            Scalar::Float(f) => Value::Float(f),
            Scalar::String(s) => Value::String(s),
        }
    }
}

/// Values serialize untagged: mappings become objects with string keys,
/// symbols become strings, and tagged values serialize as their contents.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) | Value::Symbol(s) => serializer.serialize_str(s),
            Value::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Mapping(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(&key.key_string(), value)?;
                }
                map.end()
            }
            Value::Tagged { value, .. } => value.serialize(serializer),
        }
    }
}

/// Options for loading a document.
///
/// Deserializable, so option sets can be kept in configuration; `fallback`
/// can only be set in code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Non-core tags the document may instantiate, by full tag (`!Point`,
    /// `tag:example.com,2025:point`) or by name without the handle
    /// (`Point`). Include `symbol` to allow `:name` scalars.
    pub permitted_types: Vec<String>,

    /// Symbol names allowed when `symbol` is permitted (empty = any)
    pub permitted_symbols: Vec<String>,

    /// Whether the document may use anchors and aliases
    pub allow_aliases: bool,

    /// Value returned when the document has errors or no content
    #[serde(skip)]
    pub fallback: Option<Value>,

    /// Turn string mapping keys into symbols
    pub symbolize_keys: bool,

    /// Only accept bare digit runs as decimal integers
    pub strict_integer_parsing: bool,

    /// Materialize despite warnings and failures.
    ///
    /// Never bypasses the type allow-list or the alias check.
    pub ignore_validation_errors: bool,

    /// Maximum nesting depth (default: 256).
    ///
    /// Materialization will fail with `LoadError::NestingTooDeep` if
    /// the document exceeds this depth.
    pub max_depth: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            permitted_types: Vec::new(),
            permitted_symbols: Vec::new(),
            allow_aliases: false,
            fallback: None,
            symbolize_keys: false,
            strict_integer_parsing: false,
            ignore_validation_errors: false,
            max_depth: 256,
        }
    }
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn permit_type(mut self, name: impl Into<String>) -> Self {
        self.permitted_types.push(name.into());
        self
    }

    pub fn permit_symbol(mut self, name: impl Into<String>) -> Self {
        self.permitted_symbols.push(name.into());
        self
    }

    pub fn with_aliases(mut self, allow: bool) -> Self {
        self.allow_aliases = allow;
        self
    }

    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn with_symbolized_keys(mut self, symbolize: bool) -> Self {
        self.symbolize_keys = symbolize;
        self
    }

    pub fn with_strict_integers(mut self, strict: bool) -> Self {
        self.strict_integer_parsing = strict;
        self
    }

    pub fn ignoring_validation_errors(mut self, ignore: bool) -> Self {
        self.ignore_validation_errors = ignore;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Is an explicit non-core tag on the allow-list?
    fn permits_type(&self, tag: &str) -> bool {
        let bare = tag
            .strip_prefix(CORE_TAG_PREFIX)
            .or_else(|| tag.strip_prefix('!'))
            .unwrap_or(tag);
        self.permitted_types
            .iter()
            .any(|permitted| permitted == tag || permitted == bare)
    }

    fn permits_symbol(&self, name: &str) -> bool {
        self.permitted_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case("symbol"))
            && (self.permitted_symbols.is_empty()
                || self.permitted_symbols.iter().any(|s| s == name))
    }
}

/// Materialize `node` under `options`.
pub fn materialize(node: &Node, options: &LoadOptions) -> Result<Value, LoadError> {
    Materializer::new(options).node(node, 0)
}

struct Materializer<'o> {
    options: &'o LoadOptions,
    scanner: ScalarScanner,
    /// Values of anchored nodes, by anchor id
    anchors: HashMap<usize, Value>,
}

impl<'o> Materializer<'o> {
    fn new(options: &'o LoadOptions) -> Self {
        Self {
            options,
            scanner: ScalarScanner::new(options.strict_integer_parsing),
            anchors: HashMap::new(),
        }
    }

    fn node(&mut self, node: &Node, depth: usize) -> Result<Value, LoadError> {
        if depth > self.options.max_depth {
            return Err(LoadError::NestingTooDeep {
                max_depth: self.options.max_depth,
            });
        }

        if let NodeKind::Alias(anchor) = node.kind {
            if !self.options.allow_aliases {
                return Err(LoadError::AliasesNotEnabled {
                    location: node.location,
                });
            }
            return self
                .anchors
                .get(&anchor)
                .cloned()
                .ok_or(LoadError::UnknownAnchor {
                    location: node.location,
                });
        }

        let value = match node.tag.as_deref() {
            None | Some("!") => self.plain(node, depth)?,
            Some(tag) => match tag
                .strip_prefix(CORE_TAG_PREFIX)
                .filter(|name| CORE_TAGS.contains(name))
            {
                Some(core) => self.core(core, node, depth)?,
                None => {
                    if !self.options.permits_type(tag) {
                        return Err(refuse(tag, node.location));
                    }
                    Value::Tagged {
                        tag: tag.to_string(),
                        value: Box::new(self.plain(node, depth)?),
                    }
                }
            },
        };

        if node.anchor != 0 {
            self.anchors.insert(node.anchor, value.clone());
        }
        Ok(value)
    }

    /// Materialize a node without regard to its tag.
    fn plain(&mut self, node: &Node, depth: usize) -> Result<Value, LoadError> {
        match &node.kind {
            NodeKind::Scalar { value, style } => self.scalar(value, *style, node.location),
            NodeKind::Sequence(items) => items
                .iter()
                .map(|item| self.node(item, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Sequence),
            NodeKind::Mapping(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match self.node(key, depth + 1)? {
                        Value::String(s) if self.options.symbolize_keys => Value::Symbol(s),
                        other => other,
                    };
                    pairs.push((key, self.node(value, depth + 1)?));
                }
                Ok(Value::Mapping(pairs))
            }
            NodeKind::Alias(_) => self.node(node, depth),
        }
    }

    fn scalar(&self, raw: &str, style: ScalarStyle, location: Location) -> Result<Value, LoadError> {
        if style == ScalarStyle::Plain && raw.len() > 1 {
            if let Some(name) = raw.strip_prefix(':') {
                if !self.options.permits_symbol(name) {
                    return Err(refuse("symbol", location));
                }
                return Ok(Value::Symbol(name.to_string()));
            }
        }
        Ok(self.scanner.tokenize(raw, style).into())
    }

    /// Coerce a node through one of the YAML core tags.
    fn core(&mut self, name: &str, node: &Node, depth: usize) -> Result<Value, LoadError> {
        let invalid = || LoadError::InvalidScalar {
            tag: format!("!!{}", name),
            value: node.as_str().unwrap_or(node.kind_name()).to_string(),
            location: node.location,
        };

        match (name, &node.kind) {
            ("seq", NodeKind::Sequence(_)) | ("map", NodeKind::Mapping(_)) => self.plain(node, depth),
            ("str", NodeKind::Scalar { value, .. }) => Ok(Value::String(value.clone())),
            (_, NodeKind::Scalar { value, .. }) => {
                match (name, self.scanner.tokenize(value, ScalarStyle::Plain)) {
                    ("int", Scalar::Integer(i)) => Ok(Value::Integer(i)),
                    ("float", Scalar::Float(f)) => Ok(Value::Float(f)),
                    ("float", Scalar::Integer(i)) => Ok(Value::Float(i as f64)),
                    ("bool", Scalar::Bool(b)) => Ok(Value::Bool(b)),
                    ("null", Scalar::Null) => Ok(Value::Null),
                    _ => Err(invalid()),
                }
            }
            _ => Err(invalid()),
        }
    }
}

fn refuse(tag: &str, location: Location) -> LoadError {
    warn!(
        tag,
        line = location.start_line,
        column = location.start_column,
        "refused to materialize disallowed type"
    );
    LoadError::MaliciousInput {
        tag: tag.to_string(),
        location,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(value: &str) -> Node {
        tagged_scalar(value, None)
    }

    fn tagged_scalar(value: &str, tag: Option<&str>) -> Node {
        Node::new(
            NodeKind::Scalar {
                value: value.to_string(),
                style: ScalarStyle::Plain,
            },
            tag.map(str::to_string),
            0,
            Location::point(3, 7),
        )
    }

    fn mapping(entries: Vec<(&str, Node)>) -> Node {
        Node::new(
            NodeKind::Mapping(entries.into_iter().map(|(k, v)| (scalar(k), v)).collect()),
            None,
            0,
            Location::default(),
        )
    }

    fn load(node: &Node) -> Result<Value, LoadError> {
        materialize(node, &LoadOptions::default())
    }

    #[test]
    fn test_plain_scalars() {
        assert_eq!(load(&scalar("42")).unwrap(), Value::Integer(42));
        assert_eq!(load(&scalar("true")).unwrap(), Value::Bool(true));
        assert_eq!(load(&scalar("~")).unwrap(), Value::Null);
        assert_eq!(load(&scalar("Prime")).unwrap(), Value::String("Prime".into()));
    }

    #[test]
    fn test_mapping_and_get() {
        let node = mapping(vec![("grade", scalar("Prime")), ("weight", scalar("12.5"))]);
        let value = load(&node).unwrap();
        assert_eq!(value.get("grade"), Some(&Value::String("Prime".into())));
        assert_eq!(value.get("weight"), Some(&Value::Float(12.5)));
        assert_eq!(value.get("missing"), None);
    }

    #[test]
    fn test_core_tags_coerce() {
        let s = tagged_scalar("12", Some("tag:yaml.org,2002:str"));
        assert_eq!(load(&s).unwrap(), Value::String("12".into()));

        let f = tagged_scalar("12", Some("tag:yaml.org,2002:float"));
        assert_eq!(load(&f).unwrap(), Value::Float(12.0));

        let bad = tagged_scalar("twelve", Some("tag:yaml.org,2002:int"));
        assert!(matches!(load(&bad), Err(LoadError::InvalidScalar { .. })));
    }

    #[test]
    fn test_unknown_tag_is_malicious() {
        let node = tagged_scalar("x", Some("!ruby/object:Gem::Requirement"));
        let err = load(&node).unwrap_err();
        assert!(err.is_malicious());
        assert_eq!(
            err,
            LoadError::MaliciousInput {
                tag: "!ruby/object:Gem::Requirement".into(),
                location: Location::point(3, 7),
            }
        );
    }

    #[test]
    fn test_non_core_double_bang_tag_is_malicious() {
        let node = tagged_scalar("x", Some("tag:yaml.org,2002:python/object:os.system"));
        assert!(load(&node).unwrap_err().is_malicious());
    }

    #[test]
    fn test_permitted_tag_is_wrapped() {
        let node = tagged_scalar("x,y", Some("!Point"));
        let options = LoadOptions::default().permit_type("Point");
        let value = materialize(&node, &options).unwrap();
        assert_eq!(
            value,
            Value::Tagged {
                tag: "!Point".into(),
                value: Box::new(Value::String("x,y".into())),
            }
        );

        let options = LoadOptions::default().permit_type("!Point");
        assert!(materialize(&node, &options).is_ok());
    }

    #[test]
    fn test_tagged_keys_are_checked() {
        let key = tagged_scalar("k", Some("!ruby/object:Foo"));
        let node = Node::new(
            NodeKind::Mapping(vec![(key, scalar("v"))]),
            None,
            0,
            Location::default(),
        );
        assert!(load(&node).unwrap_err().is_malicious());
    }

    #[test]
    fn test_symbols_need_permission() {
        let node = scalar(":beef");
        assert!(load(&node).unwrap_err().is_malicious());

        let options = LoadOptions::default().permit_type("symbol");
        assert_eq!(materialize(&node, &options).unwrap(), Value::Symbol("beef".into()));

        let options = LoadOptions::default().permit_type("Symbol").permit_symbol("pork");
        assert!(materialize(&node, &options).unwrap_err().is_malicious());
    }

    #[test]
    fn test_symbolize_keys() {
        let node = mapping(vec![("grade", scalar("Prime"))]);
        let options = LoadOptions::default().with_symbolized_keys(true);
        let value = materialize(&node, &options).unwrap();
        match &value {
            Value::Mapping(entries) => assert_eq!(entries[0].0, Value::Symbol("grade".into())),
            other => panic!("Expected mapping, got {:?}", other),
        }
        assert!(value.get("grade").is_some());
    }

    #[test]
    fn test_strict_integers() {
        let node = scalar("1_000");
        assert_eq!(load(&node).unwrap(), Value::Integer(1000));

        let options = LoadOptions::default().with_strict_integers(true);
        assert_eq!(materialize(&node, &options).unwrap(), Value::String("1_000".into()));
    }

    #[test]
    fn test_aliases() {
        let mut anchored = scalar("shared");
        anchored.anchor = 1;
        let alias = Node::new(NodeKind::Alias(1), None, 0, Location::point(2, 4));
        let node = Node::new(
            NodeKind::Sequence(vec![anchored, alias]),
            None,
            0,
            Location::default(),
        );

        let err = load(&node).unwrap_err();
        assert_eq!(
            err,
            LoadError::AliasesNotEnabled {
                location: Location::point(2, 4)
            }
        );

        let options = LoadOptions::default().with_aliases(true);
        let value = materialize(&node, &options).unwrap();
        assert_eq!(
            value,
            Value::Sequence(vec![Value::String("shared".into()), Value::String("shared".into())])
        );
    }

    #[test]
    fn test_unknown_anchor() {
        let node = Node::new(NodeKind::Alias(9), None, 0, Location::default());
        let options = LoadOptions::default().with_aliases(true);
        assert!(matches!(
            materialize(&node, &options),
            Err(LoadError::UnknownAnchor { .. })
        ));
    }

    #[test]
    fn test_depth_limit() {
        let mut node = scalar("leaf");
        for _ in 0..10 {
            node = Node::new(NodeKind::Sequence(vec![node]), None, 0, Location::default());
        }

        let options = LoadOptions::default().with_max_depth(5);
        assert_eq!(
            materialize(&node, &options),
            Err(LoadError::NestingTooDeep { max_depth: 5 })
        );
        assert!(load(&node).is_ok());
    }

    #[test]
    fn test_serializes_as_plain_json() {
        let value = Value::Mapping(vec![
            (Value::String("name".into()), Value::String("Ada".into())),
            (Value::Integer(1), Value::Sequence(vec![Value::Bool(true), Value::Null])),
            (Value::Symbol("kind".into()), Value::Symbol("goat".into())),
        ]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"name": "Ada", "1": [true, null], "kind": "goat"})
        );
    }

    #[test]
    fn test_options_from_json() {
        let options: LoadOptions =
            serde_json::from_str(r#"{"permitted_types": ["Date"], "allow_aliases": true}"#).unwrap();
        assert_eq!(options.permitted_types, vec!["Date"]);
        assert!(options.allow_aliases);
        assert_eq!(options.max_depth, 256);
        assert!(options.fallback.is_none());
    }
}
