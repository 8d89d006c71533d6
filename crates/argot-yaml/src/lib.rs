//! # argot-yaml
//!
//! Located YAML event streaming for argot.
//!
//! This crate turns YAML text into a flat stream of [`Event`]s, each tagged
//! with a 1-based [`Location`], and hands them to an [`EventHandler`] one at a
//! time. The schema tree builder and the document validator in
//! `argot-validation` are both event handlers; neither ever sees a
//! `yaml-rust2` type.
//!
//! It also provides the [`ScalarScanner`], which turns a raw scalar token into
//! a typed [`Scalar`] (null, boolean, integer, float or string).
//!
//! ## Example
//!
//! ```rust
//! use argot_yaml::{stream, Event, EventHandler, Location, ProtocolError};
//!
//! #[derive(Default)]
//! struct Count(usize);
//!
//! impl EventHandler for Count {
//!     fn on_event(&mut self, event: Event, _location: Location) -> Result<(), ProtocolError> {
//!         if let Event::Scalar { .. } = event {
//!             self.0 += 1;
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut count = Count::default();
//! stream("title: My Document\nauthor: Jane", &mut count).unwrap();
//! assert_eq!(count.0, 4);
//! ```

mod error;
mod event;
mod location;
mod parser;
mod scalar;

pub use error::{Error, ProtocolError, Result};
pub use event::{Event, EventHandler, ScalarStyle};
pub use location::Location;
pub use parser::stream;
pub use scalar::{Scalar, ScalarScanner};
