//! Located YAML events and the handler trait that consumes them.

use crate::{Location, ProtocolError};

/// How a scalar was written in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    /// Unquoted; subject to type inference
    Plain,
    /// Single- or double-quoted, literal or folded; always a string
    Quoted,
}

/// One node-level event from the YAML stream.
///
/// `tag` is the resolved tag string (handle followed by suffix), and `anchor`
/// is the parser-assigned anchor id, `0` when the node carries no anchor.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartMapping {
        tag: Option<String>,
        anchor: usize,
    },
    EndMapping,
    StartSequence {
        tag: Option<String>,
        anchor: usize,
    },
    EndSequence,
    Scalar {
        value: String,
        style: ScalarStyle,
        tag: Option<String>,
        anchor: usize,
    },
    Alias {
        anchor: usize,
    },
}

impl Event {
    /// Short event name used in protocol errors.
    pub fn name(&self) -> &'static str {
        match self {
            Event::StartMapping { .. } => "StartMapping",
            Event::EndMapping => "EndMapping",
            Event::StartSequence { .. } => "StartSequence",
            Event::EndSequence => "EndSequence",
            Event::Scalar { .. } => "Scalar",
            Event::Alias { .. } => "Alias",
        }
    }
}

/// Receives events one at a time, in document order.
///
/// Returning an error stops the stream; no further events are delivered.
pub trait EventHandler {
    fn on_event(&mut self, event: Event, location: Location) -> Result<(), ProtocolError>;
}
