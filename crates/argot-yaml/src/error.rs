//! Error types for located YAML streaming.

use crate::Location;
use thiserror::Error;

/// Result type alias for argot-yaml operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that end an event stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// YAML syntax error reported by the scanner
    #[error("Parse error: {message} (line {}, column {})", .location.start_line, .location.start_column)]
    Parse { message: String, location: Location },

    /// The event handler rejected the event ordering
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl From<yaml_rust2::ScanError> for Error {
    fn from(err: yaml_rust2::ScanError) -> Self {
        Error::Parse {
            message: err.info().to_string(),
            location: Location::from_marker(err.marker()),
        }
    }
}

/// A malformed event sequence.
///
/// These are never collected as diagnostics: they mean the event source is
/// broken, not that the document is invalid, so the run stops at the first one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// An event arrived in a state that cannot accept it
    #[error("Unexpected {event} while {state}")]
    UnexpectedEvent {
        event: &'static str,
        state: &'static str,
    },

    /// A close event arrived with no open construct
    #[error("{event} without a matching start event")]
    UnbalancedClose { event: &'static str },

    /// A close event does not match the innermost open construct
    #[error("{found} closes an open {expected}")]
    MismatchedClose {
        expected: &'static str,
        found: &'static str,
    },

    /// A mapping key that is not a plain scalar
    #[error("{kind} used as a mapping key is not supported")]
    UnsupportedKey { kind: &'static str },

    /// A second root construct after the document root closed
    #[error("Document root is already complete")]
    MultipleRoots,
}
