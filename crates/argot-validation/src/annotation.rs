//! Diagnostics produced while validating a document.

use argot_yaml::Location;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Severity of an annotation, ordered `Notice < Warning < Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Notice,
    Warning,
    Failure,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Level::Notice => "notice",
            Level::Warning => "warning",
            Level::Failure => "failure",
        };
        write!(f, "{}", name)
    }
}

/// One diagnostic record.
///
/// Annotations are immutable once built. Serialized, an annotation has the
/// flat record shape
/// `{path, start_line, end_line, start_column, end_column, level, message, title, raw_details}`.
///
/// Ordering compares levels only: a failure is greater than a warning, which
/// is greater than a notice. Two distinct annotations of the same level are
/// unordered; use [`Annotation::cmp_level`] to sort by severity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    path: String,
    #[serde(flatten)]
    location: Location,
    level: Level,
    message: String,
    title: String,
    #[serde(rename = "raw_details")]
    details: String,
}

impl Annotation {
    /// Source label used when none is given.
    pub const DEFAULT_PATH: &'static str = "input";

    /// Create an annotation whose title and details both default to `message`.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            path: Self::DEFAULT_PATH.to_string(),
            location: Location::default(),
            level,
            title: message.clone(),
            details: message.clone(),
            message,
        }
    }

    pub fn notice(message: impl Into<String>) -> Self {
        Self::new(Level::Notice, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message)
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(Level::Failure, message)
    }

    /// Set the source label (file name or "input").
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = details.into();
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    /// Warnings and failures block materialization; notices do not.
    pub fn is_error(&self) -> bool {
        self.level >= Level::Warning
    }

    /// Total order by level alone, for sorting.
    ///
    /// ```rust
    /// use argot_validation::Annotation;
    ///
    /// let mut annotations = vec![Annotation::failure("f"), Annotation::notice("n")];
    /// annotations.sort_by(Annotation::cmp_level);
    /// assert_eq!(annotations[0].message(), "n");
    /// ```
    pub fn cmp_level(&self, other: &Self) -> Ordering {
        self.level.cmp(&other.level)
    }
}

impl PartialOrd for Annotation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match self.level.cmp(&other.level) {
            Ordering::Equal if self == other => Some(Ordering::Equal),
            Ordering::Equal => None,
            ordering => Some(ordering),
        }
    }
}

impl fmt::Display for Annotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] At lines:{}-{} cols:{}-{} of {} -- {}: {}",
            self.level.to_string().to_uppercase(),
            self.location.start_line,
            self.location.end_line,
            self.location.start_column,
            self.location.end_column,
            self.path,
            self.title,
            self.message
        )?;
        if self.details != self.message {
            write!(f, " ({})", self.details)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_are_ordered() {
        let notice = Annotation::notice("n");
        let warning = Annotation::warning("w");
        let failure = Annotation::failure("f");

        assert!(failure > warning);
        assert!(warning > notice);
        assert!(notice < failure);
    }

    #[test]
    fn test_same_level_is_unordered_unless_equal() {
        let a = Annotation::warning("a");
        let b = Annotation::warning("b");
        assert_eq!(a.partial_cmp(&b), None);
        assert_eq!(a.partial_cmp(&a.clone()), Some(Ordering::Equal));
    }

    #[test]
    fn test_sort_by_level_is_stable() {
        let mut annotations = vec![
            Annotation::failure("first failure"),
            Annotation::notice("notice"),
            Annotation::warning("warning"),
            Annotation::failure("second failure"),
        ];
        annotations.sort_by(Annotation::cmp_level);

        let messages: Vec<&str> = annotations.iter().map(Annotation::message).collect();
        assert_eq!(messages, vec!["notice", "warning", "first failure", "second failure"]);
        assert_eq!(
            Annotation::warning("a").cmp_level(&Annotation::warning("b")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_title_and_details_default_to_message() {
        let annotation = Annotation::failure("The key 'a' is required, but missing.");
        assert_eq!(annotation.title(), annotation.message());
        assert_eq!(annotation.details(), annotation.message());
        assert_eq!(annotation.path(), "input");
        assert_eq!(annotation.location(), Location::new(1, 1, 1, 1));
    }

    #[test]
    fn test_display() {
        let annotation = Annotation::failure("The value '9001' is invalid for good_number")
            .with_title("Invalid Value")
            .with_details("Expected a value between 1 and 100")
            .with_path("farm.yml")
            .with_location(Location::new(4, 4, 14, 18));

        assert_eq!(
            annotation.to_string(),
            "[FAILURE] At lines:4-4 cols:14-18 of farm.yml -- Invalid Value: \
             The value '9001' is invalid for good_number (Expected a value between 1 and 100)"
        );

        let plain = Annotation::warning("'x' is not permitted in this document.");
        assert!(!plain.to_string().ends_with(')'));
    }

    #[test]
    fn test_serializes_as_flat_record() {
        let annotation = Annotation::failure("bad")
            .with_title("Invalid Value")
            .with_location(Location::new(2, 3, 4, 5));
        let json = serde_json::to_value(&annotation).unwrap();

        assert_eq!(json["path"], "input");
        assert_eq!(json["start_line"], 2);
        assert_eq!(json["end_line"], 3);
        assert_eq!(json["start_column"], 4);
        assert_eq!(json["end_column"], 5);
        assert_eq!(json["level"], "failure");
        assert_eq!(json["title"], "Invalid Value");
        assert_eq!(json["raw_details"], "bad");
        assert!(json.get("location").is_none());
    }
}
