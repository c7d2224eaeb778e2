//! Status values returned by check and apply

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Severity of a status, ordered from least to most severe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    /// Live state already matches
    #[default]
    NoChange,
    /// A change is needed (check) or was made (apply)
    WillChange,
    /// A change is needed but cannot be made
    CantChange,
    /// The resource could not be evaluated at all
    Fatal,
}

impl StatusLevel {
    /// Short label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Self::NoChange => "no change",
            Self::WillChange => "will change",
            Self::CantChange => "can't change",
            Self::Fatal => "fatal",
        }
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single governed attribute: live value and desired value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    /// Value observed on the system
    pub from: String,
    /// Value the resource declares
    pub to: String,
}

impl Diff {
    /// Create a new diff.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Whether the two sides differ.
    pub fn has_changes(&self) -> bool {
        self.from != self.to
    }
}

/// Outcome of a check or apply.
///
/// For check, [`Status::has_changes`] means "change needed". For apply it
/// means "changed". A status is built fresh on every call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Status {
    /// Severity
    pub level: StatusLevel,
    /// Human-readable output lines
    pub messages: Vec<String>,
    /// Governed attributes, keyed by attribute name
    pub differences: BTreeMap<String, Diff>,
}

impl Status {
    /// An empty, no-change status.
    pub fn new() -> Self {
        Self::default()
    }

    /// A fatal status carrying one message.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            level: StatusLevel::Fatal,
            messages: vec![message.into()],
            differences: BTreeMap::new(),
        }
    }

    /// Record an attribute; raises the level to `WillChange` if it differs.
    pub fn add_difference(
        &mut self,
        name: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) {
        let diff = Diff::new(from, to);
        if diff.has_changes() {
            self.raise_level(StatusLevel::WillChange);
        }
        self.differences.insert(name.into(), diff);
    }

    /// Append an output line.
    pub fn add_message(&mut self, message: impl Into<String>) {
        self.messages.push(message.into());
    }

    /// Raise the level; never lowers it.
    pub fn raise_level(&mut self, level: StatusLevel) {
        self.level = self.level.max(level);
    }

    /// Whether a change is needed (check) or was made (apply).
    pub fn has_changes(&self) -> bool {
        self.level >= StatusLevel::WillChange || self.differences.values().any(Diff::has_changes)
    }

    /// Whether the required change cannot be made.
    pub fn is_warning(&self) -> bool {
        self.level == StatusLevel::CantChange
    }

    /// Whether the resource could not be evaluated.
    pub fn is_fatal(&self) -> bool {
        self.level == StatusLevel::Fatal
    }

    /// Only the differences that have changes.
    pub fn changes(&self) -> impl Iterator<Item = (&String, &Diff)> {
        self.differences.iter().filter(|(_, d)| d.has_changes())
    }

    /// Fold a child's status into this one under `prefix`.
    ///
    /// Difference keys become `prefix/key`, messages are appended in order,
    /// and the level is the maximum of both.
    pub fn merge(&mut self, prefix: &str, other: Status) {
        self.raise_level(other.level);
        self.messages.extend(
            other
                .messages
                .into_iter()
                .map(|m| format!("{prefix}: {m}")),
        );
        for (key, diff) in other.differences {
            self.differences.insert(format!("{prefix}/{key}"), diff);
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        for message in &self.messages {
            write!(f, "\n  {message}")?;
        }
        for (key, diff) in self.changes() {
            write!(f, "\n  {key}: {:?} => {:?}", diff.from, diff.to)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_status_has_no_changes() {
        let status = Status::new();
        assert!(!status.has_changes());
        assert_eq!(status.level, StatusLevel::NoChange);
    }

    #[test]
    fn test_equal_difference_is_not_a_change() {
        let mut status = Status::new();
        status.add_difference("state", "present", "present");
        assert!(!status.has_changes());
        assert_eq!(status.changes().count(), 0);
    }

    #[test]
    fn test_difference_raises_level() {
        let mut status = Status::new();
        status.add_difference("state", "absent", "present");
        assert!(status.has_changes());
        assert_eq!(status.level, StatusLevel::WillChange);
    }

    #[test]
    fn test_raise_level_never_lowers() {
        let mut status = Status::new();
        status.raise_level(StatusLevel::CantChange);
        status.raise_level(StatusLevel::WillChange);
        assert!(status.is_warning());
    }

    #[test]
    fn test_merge_prefixes_keys_and_messages() {
        let mut child = Status::new();
        child.add_difference("uid", "1000", "1234");
        child.add_message("uid differs");

        let mut parent = Status::new();
        parent.merge("svc", child);

        assert!(parent.has_changes());
        assert!(parent.differences.contains_key("svc/uid"));
        assert_eq!(parent.messages, vec!["svc: uid differs".to_string()]);
    }

    #[test]
    fn test_display_lists_changes() {
        let mut status = Status::new();
        status.add_difference("state", "absent", "present");
        let rendered = status.to_string();
        assert!(rendered.starts_with("will change"));
        assert!(rendered.contains("state: \"absent\" => \"present\""));
    }
}
