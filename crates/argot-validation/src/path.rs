// Paths through schema and document trees

use regex::Regex;
use std::fmt;
use std::hash::{Hash, Hasher};

/// One step of a [`Path`].
///
/// Document paths only ever hold keys. Schema paths may also hold patterns:
/// a key declared with the `Pattern` tag stands for every key name the
/// expression matches.
#[derive(Debug, Clone)]
pub enum Segment {
    /// A literal key name
    Key(String),
    /// Any key name matching the expression
    Pattern(Regex),
}

impl Segment {
    /// Does this (rule-side) segment accept `other`?
    ///
    /// Keys compare by equality. A pattern accepts any key it matches, and
    /// another pattern only if both have the same source.
    pub fn matches(&self, other: &Segment) -> bool {
        match (self, other) {
            (Segment::Key(a), Segment::Key(b)) => a == b,
            (Segment::Pattern(p), Segment::Key(k)) => p.is_match(k),
            (Segment::Pattern(p), Segment::Pattern(q)) => p.as_str() == q.as_str(),
            (Segment::Key(_), Segment::Pattern(_)) => false,
        }
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Segment::Key(a), Segment::Key(b)) => a == b,
            (Segment::Pattern(p), Segment::Pattern(q)) => p.as_str() == q.as_str(),
            _ => false,
        }
    }
}

impl Eq for Segment {}

impl Hash for Segment {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Segment::Key(k) => {
                0u8.hash(state);
                k.hash(state);
            }
            Segment::Pattern(p) => {
                1u8.hash(state);
                p.as_str().hash(state);
            }
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => write!(f, "{}", k),
            Segment::Pattern(p) => write!(f, "{}", p.as_str()),
        }
    }
}

/// Path from the root to a node (e.g., ["farm", "goat_zone", "pasture_uuid"])
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    /// Create a new empty path
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Push a literal key segment onto the path
    pub fn push_key(&mut self, key: impl Into<String>) {
        self.segments.push(Segment::Key(key.into()));
    }

    /// Push any segment onto the path
    pub fn push(&mut self, segment: Segment) {
        self.segments.push(segment);
    }

    /// Pop the last segment from the path
    pub fn pop(&mut self) -> Option<Segment> {
        self.segments.pop()
    }

    /// Get the segments as a slice
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Check if the path is empty
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Get the length of the path
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// The path with its last segment removed (the root's parent is the root)
    pub fn parent(&self) -> Path {
        let end = self.segments.len().saturating_sub(1);
        Path {
            segments: self.segments[..end].to_vec(),
        }
    }

    /// This path extended by one segment
    pub fn child(&self, segment: Segment) -> Path {
        let mut child = self.clone();
        child.push(segment);
        child
    }

    /// Length-exact, per-segment match of this (rule) path against `other`.
    pub fn matches(&self, other: &Path) -> bool {
        self.len() == other.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(rule, concrete)| rule.matches(concrete))
    }

    /// Is this path strictly longer than `prefix`, with a leading run that
    /// `prefix` matches?
    pub fn extends(&self, prefix: &Path) -> bool {
        self.len() > prefix.len()
            && self
                .segments
                .iter()
                .zip(&prefix.segments)
                .all(|(rule, concrete)| rule.matches(concrete))
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl<'a> FromIterator<&'a str> for Path {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().map(|k| Segment::Key(k.to_string())).collect(),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "(root)")
        } else {
            for (i, segment) in self.segments.iter().enumerate() {
                if i > 0 {
                    write!(f, ".")?;
                }
                write!(f, "{}", segment)?;
            }
            Ok(())
        }
    }
}
