//! Comment and history caching.
//!
//! Comments and history only change when the bug changes, so both are cached
//! per bug and keyed by the bug's last change time. A call with a different
//! hint refetches and replaces the entry. Search, fetch and update calls are
//! never cached.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use crate::client::BugzillaClient;
use crate::error::TrackerError;
use crate::models::{Bug, BugUpdate, Comment, HistoryChange};
use crate::query::Query;

struct Entry<T> {
    hint: String,
    value: Vec<T>,
}

/// Caching wrapper around any [`BugzillaClient`].
pub struct CachedClient<C> {
    inner: C,
    comments: DashMap<u64, Entry<Comment>>,
    history: DashMap<u64, Entry<HistoryChange>>,
}

impl<C: BugzillaClient> CachedClient<C> {
    #[must_use]
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            comments: DashMap::new(),
            history: DashMap::new(),
        }
    }

    /// Number of bugs with cached comments.
    #[must_use]
    pub fn cached_comment_count(&self) -> usize {
        self.comments.len()
    }
}

fn lookup<T: Clone>(cache: &DashMap<u64, Entry<T>>, id: u64, hint: &str) -> Option<Vec<T>> {
    if hint.is_empty() {
        return None;
    }
    cache
        .get(&id)
        .filter(|entry| entry.hint == hint)
        .map(|entry| entry.value.clone())
}

fn store<T: Clone>(cache: &DashMap<u64, Entry<T>>, id: u64, hint: &str, value: &[T]) {
    if hint.is_empty() {
        return;
    }
    cache.insert(
        id,
        Entry {
            hint: hint.to_string(),
            value: value.to_vec(),
        },
    );
}

#[async_trait]
impl<C: BugzillaClient> BugzillaClient for CachedClient<C> {
    async fn search(&self, query: &Query) -> Result<Vec<Bug>, TrackerError> {
        self.inner.search(query).await
    }

    async fn get_bug(&self, id: u64) -> Result<Bug, TrackerError> {
        self.inner.get_bug(id).await
    }

    async fn update_bug(&self, id: u64, update: &BugUpdate) -> Result<(), TrackerError> {
        self.inner.update_bug(id, update).await
    }

    async fn get_cached_comments(
        &self,
        id: u64,
        since_hint: &str,
    ) -> Result<Vec<Comment>, TrackerError> {
        if let Some(comments) = lookup(&self.comments, id, since_hint) {
            debug!(bug_id = id, "Comment cache hit");
            return Ok(comments);
        }
        let comments = self.inner.get_cached_comments(id, since_hint).await?;
        store(&self.comments, id, since_hint, &comments);
        Ok(comments)
    }

    async fn get_cached_history(
        &self,
        id: u64,
        since_hint: &str,
    ) -> Result<Vec<HistoryChange>, TrackerError> {
        if let Some(history) = lookup(&self.history, id, since_hint) {
            debug!(bug_id = id, "History cache hit");
            return Ok(history);
        }
        let history = self.inner.get_cached_history(id, since_hint).await?;
        store(&self.history, id, since_hint, &history);
        Ok(history)
    }
}
