//! Per-recipient batching of stale notifications.

use std::collections::BTreeMap;

use bugzilla::Bug;
use tracing::{debug, warn};

/// Bug whose creator is never notified; updates to it never persist.
pub const NOTIFICATION_EXCLUDED_BUG_ID: u64 = 1_801_755;

/// Bug lines grouped by recipient e-mail, in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationBatch {
    messages: BTreeMap<String, Vec<String>>,
}

impl NotificationBatch {
    /// Queue `line` for the bug's assignee and creator.
    ///
    /// A person who is both gets the line once. Empty identities are skipped.
    pub fn add_stale_bug(&mut self, bug: &Bug, line: &str) {
        self.push(bug.id, &bug.assigned_to, line);
        if bug.creator == bug.assigned_to {
            return;
        }
        if bug.id == NOTIFICATION_EXCLUDED_BUG_ID {
            debug!(bug_id = bug.id, "Not notifying creator of excluded bug");
            return;
        }
        self.push(bug.id, &bug.creator, line);
    }

    fn push(&mut self, bug_id: u64, recipient: &str, line: &str) {
        if recipient.is_empty() {
            warn!(bug_id, "Bug has an empty assignee or creator, not notifying");
            return;
        }
        self.messages
            .entry(recipient.to_string())
            .or_default()
            .push(line.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn lines_for(&self, recipient: &str) -> Option<&[String]> {
        self.messages.get(recipient).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.messages
            .iter()
            .map(|(recipient, lines)| (recipient.as_str(), lines.as_slice()))
    }
}

/// Direct message telling a person which of their bugs went stale.
pub fn stale_notification_message(lines: &[String]) -> String {
    format!(
        "Hi there!\nThese bugs you are assigned to or you created were just marked as _LifecycleStale_:\n\n{}\n\nPlease review these and remove this flag if you think they are still valid bugs.",
        lines.join("\n")
    )
}
