//! Whiteboard tag sets.
//!
//! Bugzilla's status whiteboard is free text; the operator treats it as an
//! ordered set of space-separated tags and records its own state there.

use std::fmt;

/// Set on a bug the stale controller degraded.
pub const LIFECYCLE_STALE: &str = "LifecycleStale";

/// Set by people to restart the stale clock; cleared when the bug goes stale again.
pub const LIFECYCLE_RESET: &str = "LifecycleReset";

/// Excludes a bug from stale processing entirely.
pub const LIFECYCLE_FROZEN: &str = "LifecycleFrozen";

/// Developer whiteboard tag marking a bug the incoming reporter already announced.
pub const ASSIGNEE_NOTIFIED: &str = "AssigneeNotified";

/// Ordered tag set parsed from a whiteboard string.
///
/// Rendering joins tags with single spaces and never emits empty tokens, so
/// `parse(s).to_string()` normalizes whitespace in `s`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whiteboard {
    tags: Vec<String>,
}

impl Whiteboard {
    pub fn parse(value: &str) -> Self {
        let mut whiteboard = Self::default();
        for tag in value.split_whitespace() {
            whiteboard.insert(tag);
        }
        whiteboard
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Append `tag` unless present. Returns whether the set changed.
    pub fn insert(&mut self, tag: &str) -> bool {
        if tag.is_empty() || self.contains(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove `tag` if present. Returns whether the set changed.
    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    #[must_use]
    pub fn with(mut self, tag: &str) -> Self {
        self.insert(tag);
        self
    }

    #[must_use]
    pub fn without(mut self, tag: &str) -> Self {
        self.remove(tag);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl fmt::Display for Whiteboard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tags.join(" "))
    }
}

impl From<&str> for Whiteboard {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

/// `whiteboard` with `keyword` added.
pub fn with_keyword(whiteboard: &str, keyword: &str) -> String {
    Whiteboard::parse(whiteboard).with(keyword).to_string()
}

/// `whiteboard` with `keyword` removed.
pub fn without_keyword(whiteboard: &str, keyword: &str) -> String {
    Whiteboard::parse(whiteboard).without(keyword).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_drops_empty_tokens() {
        let wb = Whiteboard::parse("  UpcomingSprint   LifecycleReset ");
        assert_eq!(wb.to_string(), "UpcomingSprint LifecycleReset");
        assert_eq!(wb.iter().count(), 2);
        assert!(Whiteboard::parse("   ").is_empty());
    }

    #[test]
    fn test_with_keyword_is_idempotent() {
        let once = with_keyword("UpcomingSprint", LIFECYCLE_STALE);
        let twice = with_keyword(&once, LIFECYCLE_STALE);
        assert_eq!(once, "UpcomingSprint LifecycleStale");
        assert_eq!(once, twice);
    }

    #[test]
    fn test_without_keyword_missing_tag_is_noop() {
        assert_eq!(without_keyword("a b", LIFECYCLE_RESET), "a b");
        assert_eq!(without_keyword("", LIFECYCLE_RESET), "");
        assert_eq!(without_keyword("LifecycleReset", LIFECYCLE_RESET), "");
    }

    #[test]
    fn test_tags_match_whole_tokens_only() {
        let wb = Whiteboard::parse("LifecycleStaleish");
        assert!(!wb.contains(LIFECYCLE_STALE));
        assert_eq!(
            wb.with(LIFECYCLE_STALE).to_string(),
            "LifecycleStaleish LifecycleStale"
        );
    }

    #[test]
    fn test_duplicate_tags_collapse() {
        let mut wb = Whiteboard::parse("x LifecycleReset x");
        assert_eq!(wb.to_string(), "x LifecycleReset");
        assert!(wb.remove(LIFECYCLE_RESET));
        assert!(!wb.remove(LIFECYCLE_RESET));
        assert!(!wb.insert(""));
    }
}
