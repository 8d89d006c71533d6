//! Terminal rendering of annotations.

use argot_validation::{Annotation, Level};
use ariadne::{Color, Label, Report, ReportKind, Source};

/// Character offset of a 1-based line/column position in `source`.
///
/// Columns past the end of the line are clamped to it; lines past the end
/// of the source map to its length.
pub fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let mut offset = 0;
    for (index, text) in source.split_inclusive('\n').enumerate() {
        if index + 1 == line {
            let width = text.trim_end_matches(['\n', '\r']).chars().count();
            return offset + column.saturating_sub(1).min(width);
        }
        offset += text.chars().count();
    }
    offset
}

/// Render `annotation` with a source snippet.
///
/// Returns `None` if the report cannot be written, in which case callers
/// fall back to the annotation's one-line form.
pub fn render(annotation: &Annotation, source: &str) -> Option<String> {
    let location = annotation.location();
    let (kind, color) = match annotation.level() {
        Level::Failure => (ReportKind::Error, Color::Red),
        Level::Warning => (ReportKind::Warning, Color::Yellow),
        Level::Notice => (ReportKind::Advice, Color::Cyan),
    };

    let length = source.chars().count();
    let start = offset_of(source, location.start_line, location.start_column);
    let end = offset_of(source, location.end_line, location.end_column)
        .max(start + 1)
        .min(length.max(start));

    let name = annotation.path().to_string();
    let mut report = Report::build(kind, name.clone(), start)
        .with_message(annotation.title())
        .with_label(
            Label::new((name.clone(), start..end))
                .with_message(annotation.message())
                .with_color(color),
        );
    if annotation.details() != annotation.message() {
        report = report.with_note(annotation.details());
    }

    let mut output = Vec::new();
    report
        .finish()
        .write((name, Source::from(source)), &mut output)
        .ok()?;
    String::from_utf8(output).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use argot_validation::{load, LoadOptions, Ruleset, TagRegistry};

    #[test]
    fn test_offset_of() {
        let source = "name: Ada\nage: 9001\n";
        assert_eq!(offset_of(source, 1, 1), 0);
        assert_eq!(offset_of(source, 2, 6), 15);
        assert_eq!(offset_of(source, 2, 99), 19);
        assert_eq!(offset_of(source, 5, 1), source.len());
    }

    #[test]
    fn test_offset_counts_characters() {
        let source = "név: Ådá\nx: 1\n";
        assert_eq!(offset_of(source, 2, 1), 9);
    }

    #[test]
    fn test_render_invalid_value() {
        let source = "age: 9001\n";
        let ruleset = Ruleset::compile("age: !rg \"1-100\"", &TagRegistry::default()).unwrap();
        let loaded = load(&ruleset, source, "ages.yml", &LoadOptions::default()).unwrap();

        let text = render(&loaded.annotations[0], source).unwrap();
        assert!(text.contains("Invalid Value"));
        assert!(text.contains("The value '9001' is invalid for age"));
        assert!(text.contains("Expected a value between 1 and 100"));
        assert!(text.contains("ages.yml"));
    }

    #[test]
    fn test_render_missing_key_at_origin() {
        let annotation = Annotation::failure("The key 'name' is required, but missing.")
            .with_title("Missing Key")
            .with_path("ages.yml");
        let text = render(&annotation, "age: 3\n").unwrap();
        assert!(text.contains("Missing Key"));
        assert!(text.contains("The key 'name' is required, but missing."));
    }
}
