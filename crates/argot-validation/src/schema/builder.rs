// Builds a SchemaNode tree from schema-document events

use super::node::{SchemaNode, SchemaValue};
use crate::error::SchemaError;
use crate::path::{Path, Segment};
use crate::registry::TagRegistry;
use crate::tag::{Position, Tag};
use argot_yaml::{Event, EventHandler, Location, ProtocolError, ScalarScanner};
use tracing::trace;

/// Parse a schema document into an annotated tree.
///
/// Tags are resolved through `tags` and configured from the value of the node
/// they annotate. A key tagged with `Pattern` contributes its compiled
/// expression, not its text, to the paths below it.
pub fn parse(source: &str, tags: &TagRegistry) -> Result<SchemaNode, SchemaError> {
    let mut builder = SchemaBuilder::new(tags);
    argot_yaml::stream(source, &mut builder)?;
    builder.finish()
}

/// An open mapping or sequence
enum Frame {
    Mapping {
        tag: Option<String>,
        entries: Vec<(SchemaNode, SchemaNode)>,
        /// Key waiting for its value
        key: Option<SchemaNode>,
    },
    Sequence {
        tag: Option<String>,
        items: Vec<SchemaNode>,
    },
}

/// Event handler that assembles the schema tree bottom-up.
///
/// Tag configuration errors cannot be returned through [`EventHandler`], so the
/// first one is parked and every later event is ignored.
pub struct SchemaBuilder<'t> {
    tags: &'t TagRegistry,
    scanner: ScalarScanner,
    stack: Vec<Frame>,
    path: Path,
    root: Option<SchemaNode>,
    failure: Option<SchemaError>,
}

impl<'t> SchemaBuilder<'t> {
    pub fn new(tags: &'t TagRegistry) -> Self {
        Self {
            tags,
            scanner: ScalarScanner::default(),
            stack: Vec::new(),
            path: Path::new(),
            root: None,
            failure: None,
        }
    }

    /// The finished tree, or the first schema error.
    pub fn finish(self) -> Result<SchemaNode, SchemaError> {
        if let Some(err) = self.failure {
            return Err(err);
        }
        self.root.ok_or(SchemaError::Empty)
    }

    fn awaiting_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { key: None, .. }))
    }

    fn open(&mut self, frame: Frame, kind: &'static str) -> Result<(), ProtocolError> {
        if self.awaiting_key() {
            return Err(ProtocolError::UnsupportedKey { kind });
        }
        if self.stack.is_empty() && self.root.is_some() {
            return Err(ProtocolError::MultipleRoots);
        }
        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self, found: &'static str, location: Location) -> Result<(), ProtocolError> {
        let frame = self
            .stack
            .pop()
            .ok_or(ProtocolError::UnbalancedClose { event: found })?;

        let (value, tag) = match frame {
            Frame::Mapping { key: Some(_), .. } => {
                return Err(ProtocolError::UnexpectedEvent {
                    event: found,
                    state: "a mapping key awaits its value",
                });
            }
            Frame::Mapping { tag, entries, .. } if found == "EndMapping" => {
                (SchemaValue::Mapping(entries), tag)
            }
            Frame::Sequence { tag, items } if found == "EndSequence" => {
                (SchemaValue::Sequence(items), tag)
            }
            Frame::Mapping { .. } => {
                return Err(ProtocolError::MismatchedClose {
                    expected: "EndMapping",
                    found,
                });
            }
            Frame::Sequence { .. } => {
                return Err(ProtocolError::MismatchedClose {
                    expected: "EndSequence",
                    found,
                });
            }
        };

        if let Some(node) = self.node(value, tag, location, Position::Value) {
            self.attach(node)?;
        }
        Ok(())
    }

    fn scalar(
        &mut self,
        raw: String,
        scalar: SchemaValue,
        tag: Option<String>,
        location: Location,
    ) -> Result<(), ProtocolError> {
        if !self.awaiting_key() {
            if let Some(node) = self.node(scalar, tag, location, Position::Value) {
                self.attach(node)?;
            }
            return Ok(());
        }

        let Some(key) = self.node(scalar, tag, location, Position::Key) else {
            return Ok(());
        };
        let segment = match &key.tag {
            Some(Tag::Pattern(regex)) => Segment::Pattern(regex.clone()),
            _ => Segment::Key(raw),
        };
        self.path.push(segment);
        if let Some(Frame::Mapping { key: held, .. }) = self.stack.last_mut() {
            *held = Some(key);
        }
        Ok(())
    }

    /// Hand a finished node to its parent, or make it the root.
    fn attach(&mut self, node: SchemaNode) -> Result<(), ProtocolError> {
        match self.stack.last_mut() {
            None => {
                if self.root.is_some() {
                    return Err(ProtocolError::MultipleRoots);
                }
                self.root = Some(node);
            }
            Some(Frame::Sequence { items, .. }) => items.push(node),
            Some(Frame::Mapping { entries, key, .. }) => {
                let key = key.take().ok_or(ProtocolError::UnsupportedKey { kind: "node" })?;
                entries.push((key, node));
                self.path.pop();
            }
        }
        Ok(())
    }

    /// Build a node at the current path, resolving and configuring its tag.
    ///
    /// Returns `None` after parking a schema error.
    fn node(
        &mut self,
        value: SchemaValue,
        tag: Option<String>,
        location: Location,
        position: Position,
    ) -> Option<SchemaNode> {
        let kind = tag.as_deref().and_then(|t| self.tags.resolve(t));

        let tag = match kind {
            None => None,
            Some(kind) => {
                let applies = kind.applies_to();
                let misplaced = match position {
                    Position::Key => !applies.accepts_key(),
                    _ => !applies.accepts_value(),
                };
                if misplaced {
                    self.failure = Some(SchemaError::MisplacedTag {
                        tag: kind.name(),
                        position: if position == Position::Key { "key" } else { "value" },
                        location,
                    });
                    return None;
                }
                match kind.configure(&value) {
                    Ok(tag) => Some(tag),
                    Err(source) => {
                        self.failure = Some(SchemaError::Tag { source, location });
                        return None;
                    }
                }
            }
        };

        Some(SchemaNode {
            value,
            tag,
            location,
            path: self.path.clone(),
        })
    }
}

impl EventHandler for SchemaBuilder<'_> {
    fn on_event(&mut self, event: Event, location: Location) -> Result<(), ProtocolError> {
        if self.failure.is_some() {
            return Ok(());
        }
        trace!(event = event.name(), path = %self.path, "schema event");

        match event {
            Event::StartMapping { tag, .. } => self.open(
                Frame::Mapping {
                    tag,
                    entries: Vec::new(),
                    key: None,
                },
                "mapping",
            ),
            Event::StartSequence { tag, .. } => self.open(
                Frame::Sequence {
                    tag,
                    items: Vec::new(),
                },
                "sequence",
            ),
            Event::EndMapping => self.close("EndMapping", location),
            Event::EndSequence => self.close("EndSequence", location),
            Event::Scalar {
                value, style, tag, ..
            } => {
                let scalar = SchemaValue::Scalar {
                    value: self.scanner.tokenize(&value, style),
                    raw: value.clone(),
                };
                self.scalar(value, scalar, tag, location)
            }
            Event::Alias { .. } => Err(ProtocolError::UnexpectedEvent {
                event: "Alias",
                state: "reading a schema",
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use argot_yaml::Scalar;

    fn build(source: &str) -> SchemaNode {
        parse(source, &TagRegistry::with_defaults()).unwrap()
    }

    #[test]
    fn test_builds_mapping_with_paths() {
        let root = build("meats:\n  beef_from_usa:\n    grade: prime\n");
        assert!(root.path.is_empty());

        let grade = root
            .get("meats")
            .and_then(|m| m.get("beef_from_usa"))
            .and_then(|b| b.get("grade"))
            .unwrap();
        assert_eq!(grade.path.to_string(), "meats.beef_from_usa.grade");
        assert!(matches!(&grade.value, SchemaValue::Scalar { value: Scalar::String(s), .. } if s == "prime"));
    }

    #[test]
    fn test_key_nodes_carry_parent_path() {
        let root = build("farm:\n  !o goat_zone: {}\n");
        let farm = root.get("farm").unwrap();
        let SchemaValue::Mapping(entries) = &farm.value else {
            panic!("Expected mapping");
        };
        let (key, value) = &entries[0];
        assert_eq!(key.path.to_string(), "farm");
        assert!(matches!(key.tag, Some(Tag::Optional)));
        assert_eq!(value.path.to_string(), "farm.goat_zone");
    }

    #[test]
    fn test_tags_are_configured() {
        let root = build("level: !rg \"1-5\"\nname: !x \"^[A-Z]\"\n");
        assert!(matches!(root.get("level").unwrap().tag, Some(Tag::Range(_))));
        assert!(root.get("name").unwrap().is_pattern());
    }

    #[test]
    fn test_pattern_keys_become_pattern_segments() {
        let root = build("!x \"^zone_[0-9]+$\":\n  size: !t integer\n");
        let SchemaValue::Mapping(entries) = &root.value else {
            panic!("Expected mapping");
        };
        let (_, zone) = &entries[0];
        assert!(matches!(zone.path.segments()[0], Segment::Pattern(_)));
        assert_eq!(zone.path.to_string(), "^zone_[0-9]+$");
    }

    #[test]
    fn test_unknown_tags_leave_nodes_untyped() {
        let root = build("name: !mystery value\n");
        assert!(root.get("name").unwrap().tag.is_none());
    }

    #[test]
    fn test_oneof_alternatives_share_the_key_path() {
        let root = build("id: !one [!t integer, !x \"^[a-f0-9]+$\"]\n");
        let id = root.get("id").unwrap();
        assert!(id.is_one_of());
        let SchemaValue::Sequence(alternatives) = &id.value else {
            panic!("Expected sequence");
        };
        assert_eq!(alternatives.len(), 2);
        assert!(alternatives.iter().all(|alt| alt.path.to_string() == "id"));
    }

    #[test]
    fn test_misplaced_tag() {
        let err = parse("name: !r value\n", &TagRegistry::with_defaults()).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::MisplacedTag {
                tag: "required",
                position: "value",
                ..
            }
        ));

        let err = parse("!rg \"1-5\": value\n", &TagRegistry::with_defaults()).unwrap_err();
        assert!(matches!(err, SchemaError::MisplacedTag { position: "key", .. }));
    }

    #[test]
    fn test_bad_configuration_reports_location() {
        let err = parse("a: 1\nlevel: !rg \"lots\"\n", &TagRegistry::with_defaults()).unwrap_err();
        match err {
            SchemaError::Tag { source, location } => {
                assert_eq!(source, crate::TagError::InvalidRange("lots".into()));
                assert_eq!(location.start_line, 2);
            }
            other => panic!("Expected tag error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_schema() {
        let err = parse("", &TagRegistry::with_defaults()).unwrap_err();
        assert_eq!(err, SchemaError::Empty);
    }

    #[test]
    fn test_container_keys_are_rejected() {
        let err = parse("? [a, b]\n: value\n", &TagRegistry::with_defaults()).unwrap_err();
        assert_eq!(
            err,
            SchemaError::Yaml(argot_yaml::Error::Protocol(ProtocolError::UnsupportedKey {
                kind: "sequence"
            }))
        );
    }

    #[test]
    fn test_unbalanced_events_are_protocol_errors() {
        let tags = TagRegistry::with_defaults();
        let mut builder = SchemaBuilder::new(&tags);
        let err = builder
            .on_event(Event::EndMapping, Location::default())
            .unwrap_err();
        assert_eq!(err, ProtocolError::UnbalancedClose { event: "EndMapping" });

        let mut builder = SchemaBuilder::new(&tags);
        builder
            .on_event(Event::StartSequence { tag: None, anchor: 0 }, Location::default())
            .unwrap();
        let err = builder
            .on_event(Event::EndMapping, Location::default())
            .unwrap_err();
        assert_eq!(
            err,
            ProtocolError::MismatchedClose {
                expected: "EndSequence",
                found: "EndMapping"
            }
        );
    }

    #[test]
    fn test_close_with_held_key_is_a_protocol_error() {
        let tags = TagRegistry::with_defaults();
        let mut builder = SchemaBuilder::new(&tags);
        builder
            .on_event(Event::StartMapping { tag: None, anchor: 0 }, Location::default())
            .unwrap();
        builder
            .on_event(
                Event::Scalar {
                    value: "key".into(),
                    style: argot_yaml::ScalarStyle::Plain,
                    tag: None,
                    anchor: 0,
                },
                Location::default(),
            )
            .unwrap();
        let err = builder
            .on_event(Event::EndMapping, Location::default())
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnexpectedEvent { .. }));
    }
}
