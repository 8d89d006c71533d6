//! Source location information for YAML events.

use serde::{Deserialize, Serialize};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Source span of a YAML construct.
///
/// All four coordinates are 1-based. No ordering is enforced between the
/// start and end positions; a location simply records what the event source
/// reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// Line of the first character (1-based)
    pub start_line: usize,

    /// Line of the last character (1-based)
    pub end_line: usize,

    /// Column of the first character (1-based, in characters not bytes)
    pub start_column: usize,

    /// Column just past the last character (1-based)
    pub end_column: usize,
}

impl Location {
    /// Create a location with all fields specified.
    pub fn new(start_line: usize, end_line: usize, start_column: usize, end_column: usize) -> Self {
        Self {
            start_line,
            end_line,
            start_column,
            end_column,
        }
    }

    /// A zero-width location at a single position.
    pub fn point(line: usize, column: usize) -> Self {
        Self::new(line, line, column, column)
    }

    /// Create a zero-width location from a yaml-rust2 marker.
    ///
    /// yaml-rust2 lines are already 1-based; columns are 0-based.
    pub fn from_marker(marker: &Marker) -> Self {
        Self::point(marker.line().max(1), marker.col() + 1)
    }

    /// Create a location spanning from one marker to another.
    pub fn from_span(start: &Marker, end: &Marker) -> Self {
        let start = Self::from_marker(start);
        let end = Self::from_marker(end);
        start.through(&end)
    }

    /// Location of a scalar whose token begins at `start`.
    ///
    /// Quoted scalars cover their delimiters. Block scalars start at their
    /// indicator and are measured against `source`, since their text has
    /// lost its indentation.
    pub fn from_scalar(start: &Marker, text: &str, style: TScalarStyle, source: &str) -> Self {
        let location = Self::from_marker(start);
        match style {
            TScalarStyle::SingleQuoted | TScalarStyle::DoubleQuoted => {
                location.covering_quoted(text)
            }
            TScalarStyle::Literal | TScalarStyle::Folded => location.covering_block(source),
            _ => location.covering_text(text),
        }
    }

    /// Extend a zero-width start position over `text`.
    ///
    /// The end position is derived from the text itself, so multi-line block
    /// scalars end on their last line.
    pub fn covering_text(self, text: &str) -> Self {
        match text.rsplit_once('\n') {
            Some((head, tail)) => Self {
                end_line: self.start_line + head.matches('\n').count() + 1,
                end_column: tail.chars().count() + 1,
                ..self
            },
            None => Self {
                end_line: self.start_line,
                end_column: self.start_column + text.chars().count(),
                ..self
            },
        }
    }

    /// Like [`covering_text`](Self::covering_text), plus an opening and a
    /// closing quote.
    pub fn covering_quoted(self, text: &str) -> Self {
        let inner = Self {
            start_column: self.start_column + 1,
            ..self
        }
        .covering_text(text);
        Self {
            end_line: inner.end_line,
            end_column: inner.end_column + 1,
            ..self
        }
    }

    /// Extend an indicator position over the block scalar that follows it.
    ///
    /// The block runs from the line after the indicator through the last
    /// non-blank line indented at least as deeply as its first one. With no
    /// content, only the indicator is covered.
    pub fn covering_block(self, source: &str) -> Self {
        let lines: Vec<&str> = source.lines().collect();
        fn indent_of(line: &str) -> usize {
            line.len() - line.trim_start_matches(' ').len()
        }
        let parent = lines
            .get(self.start_line.saturating_sub(1))
            .map_or(0, |line| indent_of(line));

        let mut content = lines
            .iter()
            .enumerate()
            .skip(self.start_line)
            .filter(|(_, line)| !line.trim().is_empty());
        let indicator = Self {
            end_column: self.start_column + 1,
            ..self
        };
        let Some((first, line)) = content.next() else {
            return indicator;
        };
        let indent = indent_of(line);
        if indent <= parent && self.start_column > 1 {
            return indicator;
        }

        let last = content
            .take_while(|(_, line)| indent_of(line) >= indent)
            .last()
            .map_or(first, |(index, _)| index);
        Self {
            end_line: last + 1,
            end_column: lines[last].trim_end().chars().count() + 1,
            ..self
        }
    }

    /// A location starting where `self` starts and ending where `other` ends.
    pub fn through(&self, other: &Location) -> Self {
        Self {
            end_line: other.end_line,
            end_column: other.end_column,
            ..*self
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self::point(1, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_origin() {
        assert_eq!(Location::default(), Location::new(1, 1, 1, 1));
    }

    #[test]
    fn test_through() {
        let start = Location::new(2, 2, 3, 5);
        let end = Location::new(4, 4, 1, 9);
        assert_eq!(start.through(&end), Location::new(2, 4, 3, 9));
    }

    #[test]
    fn test_scalar_span_single_line() {
        let location = Location::point(3, 5).covering_text("hello");
        assert_eq!(location, Location::new(3, 3, 5, 10));
    }

    #[test]
    fn test_quoted_span_covers_delimiters() {
        let location = Location::point(1, 4).covering_quoted("xy");
        assert_eq!(location, Location::new(1, 1, 4, 8));
    }

    #[test]
    fn test_block_span_runs_to_last_content_line() {
        let source = "a: |\n  one\n\n  two\nb: 1\n";
        let location = Location::point(1, 4).covering_block(source);
        assert_eq!(location, Location::new(1, 4, 4, 6));
    }

    #[test]
    fn test_empty_block_covers_indicator() {
        let source = "a: >\nb: 1\n";
        let location = Location::point(1, 4).covering_block(source);
        assert_eq!(location, Location::new(1, 1, 4, 5));
    }

    #[test]
    fn test_scalar_span_multi_line() {
        let location = Location::point(1, 3).covering_text("one\ntwo\nthree");
        assert_eq!(location.start_line, 1);
        assert_eq!(location.end_line, 3);
        assert_eq!(location.end_column, 6);
    }
}
