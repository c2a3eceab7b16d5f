//! Stale bug controller.
//!
//! Each pass searches for open bugs without lifecycle tags, decides which of
//! them had no significant change for the configured number of days, marks
//! those stale (degraded priority, `LifecycleStale` whiteboard tag, needinfo
//! on the creator) and sends every assignee and creator one message listing
//! their newly stale bugs.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bugzilla::{AdvancedQuery, Bug, BugUpdate, BugzillaClient, Query};
use chrono::{DateTime, Utc};
use config::OperatorConfig;
use notify::ChatClient;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::controller::Controller;
use crate::error::{AggregateError, LifecycleError};
use crate::format::format_bug_message;
use crate::history::{fetch_last_significant_change_at, is_stale};
use crate::keywords::NoiseFilter;
use crate::mutation::build_stale_update;
use crate::notification::{stale_notification_message, NotificationBatch};
use crate::priority::degrade;
use crate::recorder::EventRecorder;
use crate::whiteboard::{LIFECYCLE_FROZEN, LIFECYCLE_STALE};

const CANDIDATE_STATUSES: &[&str] = &["NEW", "ASSIGNED", "POST", "ON_DEV"];

const CANDIDATE_FIELDS: &[&str] = &[
    "id",
    "creation_time",
    "last_change_time",
    "status",
    "assigned_to",
    "creator",
    "severity",
    "priority",
    "summary",
    "whiteboard",
    "flags",
];

/// Search for bugs that may be stale.
///
/// Bugs already tagged stale or frozen, urgent bugs, CVEs, security bugs,
/// blockers and bugs linked to customer cases or GitHub are never returned.
pub fn candidate_query(config: &OperatorConfig) -> Query {
    Query {
        classification: config.query.classification.clone(),
        product: config.query.product.clone(),
        status: CANDIDATE_STATUSES.iter().map(ToString::to_string).collect(),
        component: config.component_names(),
        advanced: vec![
            AdvancedQuery::new("status_whiteboard", "notsubstring", LIFECYCLE_STALE),
            AdvancedQuery::new("external_bugzilla.description", "substring", "Customer Portal")
                .negated(),
            AdvancedQuery::new("external_bugzilla.description", "substring", "Github").negated(),
            AdvancedQuery::new("bug_severity", "notequals", "urgent"),
            AdvancedQuery::new("short_desc", "notsubstring", "CVE"),
            AdvancedQuery::new("keywords", "notsubstring", "Security"),
            AdvancedQuery::new("status_whiteboard", "notsubstring", LIFECYCLE_FROZEN),
            AdvancedQuery::new("keywords", "notsubstring", "Blocker"),
        ],
        include_fields: CANDIDATE_FIELDS.iter().map(ToString::to_string).collect(),
    }
}

/// Marks bugs without significant activity as stale.
pub struct StaleController {
    client: Arc<dyn BugzillaClient>,
    chat: Arc<dyn ChatClient>,
    recorder: Arc<dyn EventRecorder>,
    config: Arc<OperatorConfig>,
}

impl StaleController {
    pub fn new(
        client: Arc<dyn BugzillaClient>,
        chat: Arc<dyn ChatClient>,
        recorder: Arc<dyn EventRecorder>,
        config: Arc<OperatorConfig>,
    ) -> Self {
        Self {
            client,
            chat,
            recorder,
            config,
        }
    }

    /// The update applied to a bug found stale.
    pub fn stale_update(&self, bug: &Bug) -> BugUpdate {
        let degraded = degrade(&self.config.stale.priority_transitions, &bug.priority);
        build_stale_update(
            bug,
            degraded,
            &self.config.stale_bug_comment,
            &self.config.stale.blocker_triage_owner,
        )
    }

    /// Run one pass as if the current time were `now`.
    ///
    /// Evaluation and update failures are collected and returned together;
    /// they never stop the pass. Failed chat deliveries are only recorded.
    /// Once `cancel` fires no further bug is evaluated or updated, but bugs
    /// already updated are still announced.
    pub async fn sync_at(
        &self,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<(), AggregateError> {
        let candidates = match self.client.search(&candidate_query(&self.config)).await {
            Ok(bugs) => bugs,
            Err(err) => {
                self.recorder
                    .warning("BuglistFailed", &format!("Failed to list bugs: {err}"));
                return Err(LifecycleError::Search(err).into());
            }
        };
        debug!(count = candidates.len(), "Got potentially stale bugs");

        let noise = NoiseFilter::significant(&self.config.stale_bug_comment);
        let minimum_age = chrono::Duration::days(i64::from(self.config.stale.minimum_stale_days));
        let mut errors = Vec::new();
        let mut unprocessed = 0;

        let mut stale = Vec::new();
        for (index, bug) in candidates.iter().enumerate() {
            if cancel.is_cancelled() {
                unprocessed += candidates.len() - index;
                break;
            }
            match fetch_last_significant_change_at(self.client.as_ref(), bug, &noise).await {
                Ok(last_change) if is_stale(last_change, now, minimum_age) => {
                    debug!(bug_id = bug.id, %last_change, "Bug is stale");
                    stale.push(bug);
                }
                Ok(last_change) => {
                    debug!(bug_id = bug.id, %last_change, "Bug had recent activity");
                }
                Err(err) => {
                    self.recorder.warning(
                        "GetCachedBugComments",
                        &format!("Skipping bug #{}: {err}", bug.id),
                    );
                    errors.push(err);
                }
            }
        }

        let mut batch = NotificationBatch::default();
        let mut announced = Vec::new();
        for (index, bug) in stale.iter().enumerate() {
            if cancel.is_cancelled() {
                unprocessed += stale.len() - index;
                break;
            }

            let update = self.stale_update(bug);
            info!(
                bug_id = bug.id,
                severity = %bug.severity,
                priority = %bug.priority,
                creator = %bug.creator,
                assignee = %bug.assigned_to,
                summary = %bug.summary,
                "Marking bug as stale"
            );
            if let Err(source) = self.client.update_bug(bug.id, &update).await {
                warn!(bug_id = bug.id, error = %source, "Failed to update bug");
                errors.push(LifecycleError::Update {
                    bug_id: bug.id,
                    source,
                });
                continue;
            }

            let bug = self.with_identities(bug).await;
            let line = format_bug_message(&self.config.bugzilla_url, &bug);
            batch.add_stale_bug(&bug, &line);
            announced.push(line);
        }

        self.deliver(&batch).await;
        if !batch.is_empty() {
            self.recorder.event(
                "StaleCommentsBugs",
                &format!("Following notifications sent:\n{}\n", announced.join("\n")),
            );
        }

        if unprocessed > 0 {
            info!(unprocessed, "Stale sync cancelled");
            errors.push(LifecycleError::Cancelled {
                remaining: unprocessed,
            });
        }
        AggregateError::into_result(errors)
    }

    /// Search results may lack assignee or creator; re-fetch the full bug
    /// when either is empty. The search result is kept if that fails.
    async fn with_identities(&self, bug: &Bug) -> Bug {
        if !bug.assigned_to.is_empty() && !bug.creator.is_empty() {
            return bug.clone();
        }
        match self.client.get_bug(bug.id).await {
            Ok(full) => full,
            Err(err) => {
                warn!(bug_id = bug.id, error = %err, "Failed to re-fetch bug for its assignee and creator");
                bug.clone()
            }
        }
    }

    async fn deliver(&self, batch: &NotificationBatch) {
        for (recipient, lines) in batch.iter() {
            let message = stale_notification_message(lines);
            if let Err(err) = self.chat.message_user(recipient, &message).await {
                self.recorder.warning(
                    "MessageFailed",
                    &format!("Message to {recipient:?} failed to send: {err}"),
                );
            }
        }
    }
}

#[async_trait]
impl Controller for StaleController {
    fn name(&self) -> &'static str {
        "StaleController"
    }

    fn resync_interval(&self) -> Duration {
        self.config.stale.resync_interval()
    }

    async fn sync(&self, cancel: &CancellationToken) -> Result<(), AggregateError> {
        self.sync_at(Utc::now(), cancel).await
    }
}
