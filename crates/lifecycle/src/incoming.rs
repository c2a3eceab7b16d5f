//! Incoming bug reporter.
//!
//! New and assigned bugs nobody announced yet are sent to their assignees,
//! tagged `AssigneeNotified` in the developer whiteboard and summarized in
//! the status channel.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bugzilla::{AdvancedQuery, Bug, BugUpdate, BugzillaClient, Query};
use config::OperatorConfig;
use notify::{ChannelRole, ChatClient};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::controller::Controller;
use crate::error::{AggregateError, LifecycleError};
use crate::format::format_bug_message;
use crate::recorder::EventRecorder;
use crate::whiteboard::{Whiteboard, ASSIGNEE_NOTIFIED};

/// Open bugs whose assignee was not told about them yet.
pub fn incoming_query(config: &OperatorConfig) -> Query {
    Query {
        classification: config.query.classification.clone(),
        product: config.query.product.clone(),
        status: vec!["NEW".to_string(), "ASSIGNED".to_string()],
        component: config.component_names(),
        advanced: vec![AdvancedQuery::new(
            "cf_devel_whiteboard",
            "notsubstring",
            ASSIGNEE_NOTIFIED,
        )],
        include_fields: [
            "id",
            "status",
            "summary",
            "assigned_to",
            "severity",
            "priority",
            "cf_devel_whiteboard",
        ]
        .iter()
        .map(ToString::to_string)
        .collect(),
    }
}

/// Bugs to announce to one assignee.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssigneeReport {
    pub bugs: Vec<Bug>,
    pub lines: Vec<String>,
}

impl AssigneeReport {
    pub fn message(&self) -> String {
        format!(
            "{}\n\n> Please set severity/priority on the bug(s) above and assign to a team member.\n",
            self.lines.join("\n")
        )
    }
}

/// Everything one pass will send.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomingReport {
    pub assignees: BTreeMap<String, AssigneeReport>,
    pub channel_lines: Vec<String>,
}

impl IncomingReport {
    pub fn build(base_url: &str, bugs: &[Bug]) -> Self {
        let mut report = Self::default();
        for bug in bugs {
            let line = format_bug_message(base_url, bug);
            report.channel_lines.push(format!("> {line}"));
            if bug.assigned_to.is_empty() {
                continue;
            }
            let entry = report.assignees.entry(bug.assigned_to.clone()).or_default();
            entry.bugs.push(bug.clone());
            entry.lines.push(line);
        }
        report
    }

    pub fn channel_message(&self) -> String {
        self.channel_lines.join("\n")
    }
}

/// Marks `bug` as announced without touching other developer whiteboard tags.
pub fn notified_update(bug: &Bug) -> BugUpdate {
    BugUpdate {
        devel_whiteboard: Some(
            Whiteboard::parse(&bug.devel_whiteboard)
                .with(ASSIGNEE_NOTIFIED)
                .to_string(),
        ),
        minor_update: true,
        ..BugUpdate::default()
    }
}

/// Announces incoming bugs to their assignees.
pub struct IncomingReporter {
    client: Arc<dyn BugzillaClient>,
    chat: Arc<dyn ChatClient>,
    recorder: Arc<dyn EventRecorder>,
    config: Arc<OperatorConfig>,
}

impl IncomingReporter {
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

    /// A bug left unmarked is announced again next pass; failures are only
    /// recorded.
    async fn mark_notified(&self, bugs: &[Bug]) {
        for bug in bugs {
            if let Err(err) = self.client.update_bug(bug.id, &notified_update(bug)).await {
                self.recorder.warning(
                    "MarkNotifiedFailed",
                    &format!("Failed to mark bug #{} as notified: {err}", bug.id),
                );
            }
        }
    }
}

#[async_trait]
impl Controller for IncomingReporter {
    fn name(&self) -> &'static str {
        "IncomingReporter"
    }

    fn resync_interval(&self) -> Duration {
        self.config.schedules.incoming_resync_interval()
    }

    async fn sync(&self, cancel: &CancellationToken) -> Result<(), AggregateError> {
        let bugs = match self.client.search(&incoming_query(&self.config)).await {
            Ok(bugs) => bugs,
            Err(err) => {
                self.recorder
                    .warning("BuglistFailed", &format!("Failed to list bugs: {err}"));
                return Err(LifecycleError::Search(err).into());
            }
        };

        let report = IncomingReport::build(&self.config.bugzilla_url, &bugs);
        if report.assignees.is_empty() {
            debug!("No incoming bugs to report");
            return Ok(());
        }

        let mut errors = Vec::new();
        let total = report.assignees.len();
        for (index, (assignee, assigned)) in report.assignees.iter().enumerate() {
            if cancel.is_cancelled() {
                errors.push(LifecycleError::Cancelled {
                    remaining: total - index,
                });
                break;
            }
            // Only bugs whose assignee got the message are marked.
            if let Err(err) = self.chat.message_user(assignee, &assigned.message()).await {
                self.recorder.warning(
                    "DeliveryFailed",
                    &format!("Message to {assignee:?} failed to send: {err}"),
                );
                continue;
            }
            info!(assignee = %assignee, bugs = assigned.bugs.len(), "Notified assignee");
            self.mark_notified(&assigned.bugs).await;
        }

        if let Err(err) = self
            .chat
            .message_channel(ChannelRole::Status, &report.channel_message())
            .await
        {
            self.recorder.warning(
                "DeliveryFailed",
                &format!("Status channel report failed to send: {err}"),
            );
            errors.push(err.into());
        }
        AggregateError::into_result(errors)
    }
}
