//! Last significant change of a bug.
//!
//! The stale clock starts at the bug's creation and is pushed forward by
//! every comment the noise filter lets through and by every history record
//! that took `LifecycleStale` off the whiteboard.

use bugzilla::{Bug, BugzillaClient, Comment, HistoryChange};
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use crate::error::LifecycleError;
use crate::keywords::NoiseFilter;
use crate::whiteboard::{Whiteboard, LIFECYCLE_STALE};

/// History field carrying the status whiteboard.
const WHITEBOARD_FIELD: &str = "whiteboard";

/// Parse a Bugzilla RFC 3339 timestamp.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(value).map(|time| time.with_timezone(&Utc))
}

/// `true` when `last_change` is strictly older than `now - minimum_age`.
///
/// A cutoff before the earliest representable time is never reached.
pub fn is_stale(last_change: DateTime<Utc>, now: DateTime<Utc>, minimum_age: Duration) -> bool {
    now.checked_sub_signed(minimum_age)
        .is_some_and(|cutoff| last_change < cutoff)
}

/// Whether a history record removed `LifecycleStale` from the whiteboard.
pub fn removes_stale_tag(change: &HistoryChange) -> bool {
    change.changes.iter().any(|delta| {
        delta.field_name == WHITEBOARD_FIELD
            && Whiteboard::parse(&delta.removed).contains(LIFECYCLE_STALE)
            && !Whiteboard::parse(&delta.added).contains(LIFECYCLE_STALE)
    })
}

struct Event<'a> {
    label: String,
    time: &'a str,
}

/// Latest time among `start` and `events`; unparseable times are skipped.
fn latest<'a>(bug_id: u64, start: DateTime<Utc>, events: impl Iterator<Item = Event<'a>>) -> DateTime<Utc> {
    events.fold(start, |latest, event| match parse_timestamp(event.time) {
        Ok(time) => latest.max(time),
        Err(err) => {
            warn!(
                bug_id,
                event = %event.label,
                time = %event.time,
                error = %err,
                "Skipping event with unparseable time"
            );
            latest
        }
    })
}

/// Compute the last significant change from already fetched data.
///
/// # Errors
/// Returns [`LifecycleError::CreationTime`] if the bug's creation time does
/// not parse.
pub fn last_significant_change_at(
    bug: &Bug,
    comments: &[Comment],
    history: &[HistoryChange],
    noise: &NoiseFilter,
) -> Result<DateTime<Utc>, LifecycleError> {
    let created = parse_timestamp(&bug.creation_time).map_err(|source| {
        LifecycleError::CreationTime {
            bug_id: bug.id,
            value: bug.creation_time.clone(),
            source,
        }
    })?;

    let comment_events = comments.iter().filter_map(|comment| {
        if let Some(keyword) = noise.matching(&comment.text) {
            debug!(bug_id = bug.id, comment = comment.count, keyword, "Ignoring comment");
            return None;
        }
        Some(Event {
            label: format!("comment #{}", comment.count),
            time: &comment.time,
        })
    });
    let after_comments = latest(bug.id, created, comment_events);

    let reset_events = history
        .iter()
        .filter(|change| removes_stale_tag(change))
        .map(|change| Event {
            label: format!("{LIFECYCLE_STALE} removal by {}", change.who),
            time: &change.when,
        });
    Ok(latest(bug.id, after_comments, reset_events))
}

/// Fetch comments and history through the client's cache and compute the
/// last significant change, ignoring the bot's own comments.
///
/// # Errors
/// Fails on creation time parse errors and on fetch errors.
pub async fn fetch_last_significant_change_at(
    client: &dyn BugzillaClient,
    bug: &Bug,
    noise: &NoiseFilter,
) -> Result<DateTime<Utc>, LifecycleError> {
    let comments = client
        .get_cached_comments(bug.id, &bug.last_change_time)
        .await
        .map_err(|source| LifecycleError::Fetch {
            bug_id: bug.id,
            source,
        })?;
    let history = client
        .get_cached_history(bug.id, &bug.last_change_time)
        .await
        .map_err(|source| LifecycleError::Fetch {
            bug_id: bug.id,
            source,
        })?;
    last_significant_change_at(bug, &comments, &history, noise)
}

/// Like [`fetch_last_significant_change_at`] but the bot's comments count as
/// activity; only process noise is ignored.
///
/// # Errors
/// Fails on creation time parse errors and on fetch errors.
pub async fn fetch_last_significant_or_bot_change_at(
    client: &dyn BugzillaClient,
    bug: &Bug,
) -> Result<DateTime<Utc>, LifecycleError> {
    fetch_last_significant_change_at(client, bug, &NoiseFilter::process_only()).await
}
