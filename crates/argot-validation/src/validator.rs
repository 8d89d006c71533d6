// Streaming document validator

use crate::annotation::Annotation;
use crate::document::{Node, NodeKind};
use crate::path::Path;
use crate::schema::Ruleset;
use crate::tag::Tag;
use argot_yaml::{Event, EventHandler, Location, ProtocolError, ScalarScanner, ScalarStyle};
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use tracing::{debug, trace};

/// Validate `source` against `ruleset`.
///
/// `label` names the document in every annotation (a file name, or
/// `"input"`). Schema violations are returned as annotations on the
/// [`Validation`]; only malformed YAML or a broken event stream is an `Err`.
pub fn validate(
    ruleset: &Ruleset,
    source: &str,
    label: &str,
) -> Result<Validation, argot_yaml::Error> {
    Validator::parse_and_validate(ruleset, source, label)
}

/// Result of one validation run
#[derive(Debug, Clone)]
pub struct Validation {
    label: String,
    root: Option<Node>,
    annotations: Vec<Annotation>,
    encountered: IndexMap<Path, Location>,
}

impl Validation {
    /// Source label the annotations refer to
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The pruned document: only permitted, valid nodes are kept.
    pub fn root(&self) -> Option<&Node> {
        self.root.as_ref()
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn into_annotations(self) -> Vec<Annotation> {
        self.annotations
    }

    /// Does the run hold any warning or failure?
    pub fn has_errors(&self) -> bool {
        self.annotations.iter().any(Annotation::is_error)
    }

    /// Permitted paths seen in the document, with the first location of each
    pub fn encountered_paths(&self) -> impl Iterator<Item = (&Path, &Location)> {
        self.encountered.iter()
    }
}

/// An open mapping or sequence
enum Frame {
    Mapping {
        tag: Option<String>,
        anchor: usize,
        entries: Vec<(Node, Node)>,
        /// Key waiting for its value
        key: Option<Node>,
    },
    Sequence {
        tag: Option<String>,
        anchor: usize,
        items: Vec<Node>,
    },
}

/// Event handler that checks a document against a ruleset as it streams.
///
/// A validator lives for exactly one document: feed it events, then call
/// [`finish`](Validator::finish) to run the completeness pass.
pub struct Validator<'r> {
    ruleset: &'r Ruleset,
    label: String,
    scanner: ScalarScanner,
    stack: Vec<Frame>,
    path: Path,
    root: Option<Node>,
    /// The root construct has closed
    complete: bool,
    encountered: IndexMap<Path, Location>,
    missing: HashSet<Path>,
    annotations: Vec<Annotation>,
    /// Anchored nodes that made it into the pruned tree
    anchors: HashMap<usize, Node>,
}

impl<'r> Validator<'r> {
    pub fn new(ruleset: &'r Ruleset, label: impl Into<String>) -> Self {
        Self {
            ruleset,
            label: label.into(),
            scanner: ScalarScanner::default(),
            stack: Vec::new(),
            path: Path::new(),
            root: None,
            complete: false,
            encountered: IndexMap::new(),
            missing: HashSet::new(),
            annotations: Vec::new(),
            anchors: HashMap::new(),
        }
    }

    /// Stream `source` through a fresh validator and finish it.
    pub fn parse_and_validate(
        ruleset: &'r Ruleset,
        source: &str,
        label: &str,
    ) -> Result<Validation, argot_yaml::Error> {
        let mut validator = Validator::new(ruleset, label);
        argot_yaml::stream(source, &mut validator)?;
        Ok(validator.finish())
    }

    /// Run the completeness pass and hand over the results.
    ///
    /// Required keys can only be judged missing once the whole document has
    /// been seen, so this must come after the last event.
    pub fn finish(mut self) -> Validation {
        self.check_completeness();
        debug!(
            label = %self.label,
            annotations = self.annotations.len(),
            paths = self.encountered.len(),
            "validated document"
        );
        Validation {
            label: self.label,
            root: self.root,
            annotations: self.annotations,
            encountered: self.encountered,
        }
    }

    fn awaiting_key(&self) -> bool {
        matches!(self.stack.last(), Some(Frame::Mapping { key: None, .. }))
    }

    fn open(&mut self, frame: Frame, kind: &'static str) -> Result<(), ProtocolError> {
        if self.awaiting_key() {
            return Err(ProtocolError::UnsupportedKey { kind });
        }
        if self.stack.is_empty() && self.complete {
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

        let node = match frame {
            Frame::Mapping { key: Some(_), .. } => {
                return Err(ProtocolError::UnexpectedEvent {
                    event: found,
                    state: "a mapping key awaits its value",
                });
            }
            Frame::Mapping {
                tag,
                anchor,
                entries,
                ..
            } if found == "EndMapping" => {
                Node::new(NodeKind::Mapping(entries), tag, anchor, location)
            }
            Frame::Sequence { tag, anchor, items } if found == "EndSequence" => {
                Node::new(NodeKind::Sequence(items), tag, anchor, location)
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

        self.attach(node, true)
    }

    fn scalar(
        &mut self,
        value: String,
        style: ScalarStyle,
        tag: Option<String>,
        anchor: usize,
        location: Location,
    ) -> Result<(), ProtocolError> {
        if self.awaiting_key() {
            self.path.push_key(value.clone());
            let key = Node::new(NodeKind::Scalar { value, style }, tag, anchor, location);
            if let Some(Frame::Mapping { key: held, .. }) = self.stack.last_mut() {
                *held = Some(key);
            }
            return Ok(());
        }

        if self.stack.is_empty() && self.complete {
            return Err(ProtocolError::MultipleRoots);
        }

        let valid = self.validate_value(&value, style, location);
        let node = Node::new(NodeKind::Scalar { value, style }, tag, anchor, location);
        self.attach(node, valid)
    }

    fn alias(&mut self, anchor: usize, location: Location) -> Result<(), ProtocolError> {
        if self.awaiting_key() {
            return Err(ProtocolError::UnsupportedKey { kind: "alias" });
        }
        if self.stack.is_empty() {
            return Err(ProtocolError::UnexpectedEvent {
                event: "Alias",
                state: "no construct is open",
            });
        }
        // An alias is checked at the path it lands on. Anchors that were
        // pruned are left for the materializer to refuse.
        let valid = match self.anchors.get(&anchor).cloned() {
            Some(target) => self.revalidate(&target, location, &mut vec![anchor]),
            None => true,
        };
        let node = Node::new(NodeKind::Alias(anchor), None, 0, location);
        self.attach(node, valid)
    }

    /// Check an already-built node against the rules at the current path.
    ///
    /// The whole subtree must pass for the node to be kept, since an alias
    /// cannot be partially pruned.
    fn revalidate(&mut self, node: &Node, location: Location, visiting: &mut Vec<usize>) -> bool {
        match &node.kind {
            NodeKind::Scalar { value, style } => self.validate_value(value, *style, location),
            NodeKind::Sequence(items) => items
                .iter()
                .fold(true, |valid, item| self.revalidate(item, location, visiting) && valid),
            NodeKind::Mapping(entries) => {
                let mut valid = true;
                for (key, value) in entries {
                    let Some(name) = key.as_str() else { continue };
                    self.path.push_key(name.to_string());
                    let kept = self.record(location) && self.revalidate(value, location, visiting);
                    self.path.pop();
                    valid &= kept;
                }
                valid
            }
            NodeKind::Alias(anchor) => {
                if visiting.contains(anchor) {
                    return true;
                }
                let Some(target) = self.anchors.get(anchor).cloned() else {
                    return true;
                };
                visiting.push(*anchor);
                let valid = self.revalidate(&target, location, visiting);
                visiting.pop();
                valid
            }
        }
    }

    /// Hand a finished node to the innermost open container, or make it the
    /// document root.
    ///
    /// A node joins the pruned tree only if its path is permitted and its
    /// value passed validation. Permitted paths are recorded as encountered
    /// either way.
    fn attach(&mut self, node: Node, valid: bool) -> Result<(), ProtocolError> {
        if self.stack.is_empty() {
            if self.complete {
                return Err(ProtocolError::MultipleRoots);
            }
            self.complete = true;
            if valid {
                self.root = Some(node);
            }
            return Ok(());
        }

        let keep = self.record(node.location) && valid;
        if keep && node.anchor != 0 {
            self.anchors.insert(node.anchor, node.clone());
        }
        match self.stack.last_mut() {
            Some(Frame::Sequence { items, .. }) => {
                if keep {
                    items.push(node);
                }
            }
            Some(Frame::Mapping { entries, key, .. }) => {
                let key = key.take().ok_or(ProtocolError::UnexpectedEvent {
                    event: node.kind_name(),
                    state: "a mapping awaits a key",
                })?;
                if keep {
                    entries.push((key, node));
                }
                self.path.pop();
            }
            None => {}
        }
        Ok(())
    }

    /// Is the current path permitted? If so, note where it was first seen.
    fn record(&mut self, location: Location) -> bool {
        if !self.ruleset.permit(&self.path) {
            return false;
        }
        if !self.encountered.contains_key(&self.path) {
            self.encountered.insert(self.path.clone(), location);
        }
        true
    }

    /// Check one scalar against the rule at the current path.
    fn validate_value(&mut self, raw: &str, style: ScalarStyle, location: Location) -> bool {
        let ruleset = self.ruleset;
        let value = self.scanner.tokenize(raw, style);

        let Some(rule) = ruleset.lookup(&self.path) else {
            let annotation =
                Annotation::warning(format!("'{}' is not permitted in this document.", self.path))
                    .with_title("Invalid Key")
                    .with_path(&self.label)
                    .with_location(location);
            self.annotations.push(annotation);
            return false;
        };

        if rule.value.is_empty() || rule.value.iter().any(|tag| tag.validate(&value)) {
            return true;
        }

        let expectations: Vec<String> = rule.value.iter().filter_map(Tag::expectation).collect();
        let annotation =
            Annotation::failure(format!("The value '{}' is invalid for {}", value, self.path))
                .with_title("Invalid Value")
                .with_details(format!("Expected {}", either(&expectations)))
                .with_path(&self.label)
                .with_location(location);
        self.annotations.push(annotation);
        false
    }

    /// Report required keys that never appeared.
    fn check_completeness(&mut self) {
        let ruleset = self.ruleset;

        for path in ruleset.paths() {
            if ruleset.required(path) && !self.seen(path) && self.seen(&path.parent()) {
                self.missing_key(path);
            }
        }

        let tracked: Vec<Path> = self.encountered.keys().cloned().collect();
        for tracked_path in &tracked {
            for segment in ruleset.subkeys(tracked_path) {
                let candidate = tracked_path.child(segment);
                if ruleset.lookup(&candidate).is_some()
                    && ruleset.required(&candidate)
                    && !self.seen(&candidate)
                {
                    self.missing_key(&candidate);
                }
            }
        }
    }

    /// Does any encountered path satisfy `path`? The root always exists.
    fn seen(&self, path: &Path) -> bool {
        path.is_empty() || self.encountered.keys().any(|tracked| path.matches(tracked))
    }

    fn missing_key(&mut self, path: &Path) {
        if !self.missing.insert(path.clone()) {
            return;
        }

        let location = self
            .encountered
            .get(path)
            .or_else(|| self.encountered.get(&path.parent()))
            .copied()
            .unwrap_or_default();

        let annotation =
            Annotation::failure(format!("The key '{}' is required, but missing.", path))
                .with_title("Missing Key")
                .with_path(&self.label)
                .with_location(location);
        self.annotations.push(annotation);
    }
}

impl EventHandler for Validator<'_> {
    fn on_event(&mut self, event: Event, location: Location) -> Result<(), ProtocolError> {
        trace!(event = event.name(), path = %self.path, "document event");

        match event {
            Event::StartMapping { tag, anchor } => self.open(
                Frame::Mapping {
                    tag,
                    anchor,
                    entries: Vec::new(),
                    key: None,
                },
                "mapping",
            ),
            Event::StartSequence { tag, anchor } => self.open(
                Frame::Sequence {
                    tag,
                    anchor,
                    items: Vec::new(),
                },
                "sequence",
            ),
            Event::EndMapping => self.close("EndMapping", location),
            Event::EndSequence => self.close("EndSequence", location),
            Event::Scalar {
                value,
                style,
                tag,
                anchor,
            } => self.scalar(value, style, tag, anchor, location),
            Event::Alias { anchor } => self.alias(anchor, location),
        }
    }
}

/// Join alternatives as "a, b, or c".
fn either(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [init @ .., last] => format!("{}, or {}", init.join(", "), last),
    }
}
