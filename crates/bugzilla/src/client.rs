//! Tracker client trait.

use async_trait::async_trait;

use crate::error::TrackerError;
use crate::models::{Bug, BugUpdate, Comment, HistoryChange};
use crate::query::Query;

/// Operations the controllers need from Bugzilla.
///
/// `since_hint` on the comment/history calls is a cache key (the bug's last
/// change time), not a filter: implementations always return the full list,
/// oldest first.
#[async_trait]
pub trait BugzillaClient: Send + Sync {
    /// Search bugs matching `query`.
    async fn search(&self, query: &Query) -> Result<Vec<Bug>, TrackerError>;

    /// Fetch a single bug with all default fields.
    async fn get_bug(&self, id: u64) -> Result<Bug, TrackerError>;

    /// Apply an update to a bug.
    async fn update_bug(&self, id: u64, update: &BugUpdate) -> Result<(), TrackerError>;

    /// All comments on a bug.
    async fn get_cached_comments(
        &self,
        id: u64,
        since_hint: &str,
    ) -> Result<Vec<Comment>, TrackerError>;

    /// All history records of a bug.
    async fn get_cached_history(
        &self,
        id: u64,
        since_hint: &str,
    ) -> Result<Vec<HistoryChange>, TrackerError>;
}
