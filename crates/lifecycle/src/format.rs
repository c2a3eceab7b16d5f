//! Slack renderings of bugs.

use bugzilla::Bug;

/// Browser URL of a bug.
pub fn bug_url(base_url: &str, id: u64) -> String {
    format!("{}/show_bug.cgi?id={id}", base_url.trim_end_matches('/'))
}

/// One-line Slack summary: link, status and summary, then severity and
/// priority when the bug carries a severity.
pub fn format_bug_message(base_url: &str, bug: &Bug) -> String {
    let mut line = format!("<{}|#{}>", bug_url(base_url, bug.id), bug.id);
    if !bug.status.is_empty() {
        line.push_str(&format!(" [*{}*]", bug.status));
    }
    line.push(' ');
    line.push_str(&bug.summary);
    if !bug.severity.is_empty() {
        line.push_str(&format!(" (S:{} P:{})", bug.severity, bug.priority));
    }
    line
}
