//! Drives yaml-rust2 and forwards located events to an [`EventHandler`].

use crate::{Error, Event, EventHandler, Location, ProtocolError, Result, ScalarStyle};
use tracing::trace;
use yaml_rust2::parser::{Event as YamlEvent, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Stream the first YAML document in `content` into `handler`.
///
/// Events are delivered synchronously, in document order. Stream and
/// document boundaries are not forwarded.
///
/// # Example
///
/// ```rust
/// use argot_yaml::{stream, Event, EventHandler, Location, ProtocolError};
///
/// struct Keys(Vec<String>);
///
/// impl EventHandler for Keys {
///     fn on_event(&mut self, event: Event, _: Location) -> Result<(), ProtocolError> {
///         if let Event::Scalar { value, .. } = event {
///             self.0.push(value);
///         }
///         Ok(())
///     }
/// }
///
/// let mut keys = Keys(Vec::new());
/// stream("a: 1", &mut keys).unwrap();
/// assert_eq!(keys.0, vec!["a", "1"]);
/// ```
///
/// # Errors
///
/// Returns [`Error::Parse`] if the YAML is malformed, or [`Error::Protocol`]
/// with the first protocol violation reported by the handler.
pub fn stream<H: EventHandler + ?Sized>(content: &str, handler: &mut H) -> Result<()> {
    let mut parser = Parser::new_from_str(content);
    let mut forwarder = Forwarder::new(handler, content);

    parser
        .load(&mut forwarder, false) // false = single document only
        .map_err(Error::from)?;

    match forwarder.failure {
        Some(err) => Err(Error::Protocol(err)),
        None => Ok(()),
    }
}

/// Adapter that implements MarkedEventReceiver on behalf of a handler.
///
/// yaml-rust2 receivers cannot fail, so the first protocol error is parked
/// here and every later event is dropped.
struct Forwarder<'h, 's, H: ?Sized> {
    handler: &'h mut H,

    /// Text being parsed, for measuring block scalars
    source: &'s str,

    /// Start markers of the open mappings and sequences
    starts: Vec<Marker>,

    failure: Option<ProtocolError>,
}

impl<'h, 's, H: EventHandler + ?Sized> Forwarder<'h, 's, H> {
    fn new(handler: &'h mut H, source: &'s str) -> Self {
        Self {
            handler,
            source,
            starts: Vec::new(),
            failure: None,
        }
    }

    fn forward(&mut self, event: Event, location: Location) {
        trace!(event = event.name(), line = location.start_line, "yaml event");
        if let Err(err) = self.handler.on_event(event, location) {
            self.failure = Some(err);
        }
    }

    fn close_location(&mut self, marker: &Marker) -> Location {
        match self.starts.pop() {
            Some(start) => Location::from_span(&start, marker),
            None => Location::from_marker(marker),
        }
    }
}

impl<H: EventHandler + ?Sized> MarkedEventReceiver for Forwarder<'_, '_, H> {
    fn on_event(&mut self, ev: YamlEvent, marker: Marker) {
        if self.failure.is_some() {
            return;
        }

        match ev {
            YamlEvent::Nothing
            | YamlEvent::StreamStart
            | YamlEvent::StreamEnd
            | YamlEvent::DocumentStart
            | YamlEvent::DocumentEnd => {}

            YamlEvent::Scalar(value, style, anchor, tag) => {
                let location = Location::from_scalar(&marker, &value, style, self.source);
                let style = if matches!(style, TScalarStyle::Plain) {
                    ScalarStyle::Plain
                } else {
                    ScalarStyle::Quoted
                };
                self.forward(
                    Event::Scalar {
                        value,
                        style,
                        tag: tag.map(tag_string),
                        anchor,
                    },
                    location,
                );
            }

            YamlEvent::SequenceStart(anchor, tag) => {
                self.starts.push(marker);
                self.forward(
                    Event::StartSequence {
                        tag: tag.map(tag_string),
                        anchor,
                    },
                    Location::from_marker(&marker),
                );
            }

            YamlEvent::SequenceEnd => {
                let location = self.close_location(&marker);
                self.forward(Event::EndSequence, location);
            }

            YamlEvent::MappingStart(anchor, tag) => {
                self.starts.push(marker);
                self.forward(
                    Event::StartMapping {
                        tag: tag.map(tag_string),
                        anchor,
                    },
                    Location::from_marker(&marker),
                );
            }

            YamlEvent::MappingEnd => {
                let location = self.close_location(&marker);
                self.forward(Event::EndMapping, location);
            }

            YamlEvent::Alias(anchor) => {
                self.forward(Event::Alias { anchor }, Location::from_marker(&marker));
            }
        }
    }
}

/// Render a resolved yaml-rust2 tag as a single string.
///
/// `!r` stays `!r`; `!!str` arrives with its handle already expanded to
/// `tag:yaml.org,2002:`, and handles declared through `%TAG` likewise.
fn tag_string(tag: Tag) -> String {
    format!("{}{}", tag.handle, tag.suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        events: Vec<(Event, Location)>,
    }

    impl EventHandler for Recorder {
        fn on_event(&mut self, event: Event, location: Location) -> std::result::Result<(), ProtocolError> {
            self.events.push((event, location));
            Ok(())
        }
    }

    struct RejectAll;

    impl EventHandler for RejectAll {
        fn on_event(&mut self, _: Event, _: Location) -> std::result::Result<(), ProtocolError> {
            Err(ProtocolError::MultipleRoots)
        }
    }

    fn record(content: &str) -> Vec<(Event, Location)> {
        let mut recorder = Recorder::default();
        stream(content, &mut recorder).unwrap();
        recorder.events
    }

    #[test]
    fn test_mapping_events() {
        let events = record("title: My Document");
        let names: Vec<_> = events.iter().map(|(e, _)| e.name()).collect();
        assert_eq!(names, vec!["StartMapping", "Scalar", "Scalar", "EndMapping"]);
    }

    #[test]
    fn test_scalar_locations_are_one_based() {
        let events = record("title: My Document");
        let (_, key_location) = &events[1];
        assert_eq!(key_location.start_line, 1);
        assert_eq!(key_location.start_column, 1);
        assert_eq!(key_location.end_column, 6);

        let (_, value_location) = &events[2];
        assert_eq!(value_location.start_column, 8);
    }

    #[test]
    fn test_quoted_scalars_are_marked() {
        let events = record("a: \"1\"\nb: 1");
        let styles: Vec<_> = events
            .iter()
            .filter_map(|(e, _)| match e {
                Event::Scalar { value, style, .. } => Some((value.clone(), *style)),
                _ => None,
            })
            .collect();
        assert_eq!(styles[1], ("1".to_string(), ScalarStyle::Quoted));
        assert_eq!(styles[3], ("1".to_string(), ScalarStyle::Plain));
    }

    #[test]
    fn test_quoted_scalar_span_includes_quotes() {
        let events = record("a: \"xy\"\nb: 'z'\n");
        assert_eq!(events[2].1, Location::new(1, 1, 4, 8));
        assert_eq!(events[4].1, Location::new(2, 2, 4, 7));
    }

    #[test]
    fn test_block_scalar_span_starts_at_indicator() {
        let events = record("text: |\n  first\n  second line\nnext: 1\n");
        let (event, location) = &events[2];
        assert!(matches!(event, Event::Scalar { value, .. } if value == "first\nsecond line\n"));
        assert_eq!(*location, Location::new(1, 3, 7, 14));
    }

    #[test]
    fn test_local_tags_are_kept() {
        let events = record("!r name: value");
        match &events[1].0 {
            Event::Scalar { tag, .. } => assert_eq!(tag.as_deref(), Some("!r")),
            other => panic!("Expected scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_core_tags_are_expanded() {
        let events = record("a: !!str 12");
        match &events[2].0 {
            Event::Scalar { tag, .. } => {
                assert_eq!(tag.as_deref(), Some("tag:yaml.org,2002:str"))
            }
            other => panic!("Expected scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_container_location_spans_to_close() {
        let events = record("outer:\n  inner: 1\n  other: 2\n");
        let (_, location) = events
            .iter()
            .rfind(|(e, _)| matches!(e, Event::EndMapping))
            .unwrap();
        assert_eq!(location.start_line, 1);
        assert!(location.end_line >= 3);
    }

    #[test]
    fn test_anchor_and_alias() {
        let events = record("a: &x 1\nb: *x");
        let anchor = events.iter().find_map(|(e, _)| match e {
            Event::Scalar { value, anchor, .. } if value == "1" => Some(*anchor),
            _ => None,
        });
        let alias = events.iter().find_map(|(e, _)| match e {
            Event::Alias { anchor } => Some(*anchor),
            _ => None,
        });
        assert!(anchor.unwrap() > 0);
        assert_eq!(anchor, alias);
    }

    #[test]
    fn test_first_protocol_error_stops_stream() {
        let err = stream("a: 1", &mut RejectAll).unwrap_err();
        assert_eq!(err, Error::Protocol(ProtocolError::MultipleRoots));
    }

    #[test]
    fn test_parse_error() {
        let err = stream("a: [1, 2", &mut Recorder::default()).unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }
}
