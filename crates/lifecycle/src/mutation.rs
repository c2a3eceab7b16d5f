//! The update that marks a bug stale.

use bugzilla::{Bug, BugComment, BugUpdate, FlagChange, Priority};

use crate::whiteboard::{Whiteboard, LIFECYCLE_RESET, LIFECYCLE_STALE};

pub const NEEDINFO_FLAG: &str = "needinfo";
pub const BLOCKER_FLAG: &str = "blocker";

/// Build the stale update for `bug`.
///
/// The whiteboard gains `LifecycleStale` and loses `LifecycleReset`, the
/// priority becomes `degraded`, `stale_comment` is posted and the creator
/// is asked for info. A proposed blocker that degraded to low gets
/// `blocker-` on behalf of `triage_owner`.
pub fn build_stale_update(
    bug: &Bug,
    degraded: Priority,
    stale_comment: &str,
    triage_owner: &str,
) -> BugUpdate {
    let whiteboard = Whiteboard::parse(&bug.whiteboard)
        .with(LIFECYCLE_STALE)
        .without(LIFECYCLE_RESET);

    let mut flags = vec![FlagChange {
        name: NEEDINFO_FLAG.to_string(),
        status: "?".to_string(),
        requestee: Some(bug.creator.clone()),
    }];
    if degraded == Priority::Low && bug.has_flag(BLOCKER_FLAG, "?") {
        flags.push(FlagChange {
            name: BLOCKER_FLAG.to_string(),
            status: "-".to_string(),
            requestee: Some(triage_owner.to_string()),
        });
    }

    BugUpdate {
        whiteboard: Some(whiteboard.to_string()),
        priority: Some(degraded),
        flags,
        comment: Some(BugComment {
            body: stale_comment.to_string(),
        }),
        ..BugUpdate::default()
    }
}
