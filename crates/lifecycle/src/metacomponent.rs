//! Meta-component reassignment.
//!
//! A meta-component is a keyword in the developer whiteboard that routes a
//! bug to a different lead than its Bugzilla component. New bugs still
//! assigned to their component lead are handed to the meta-component lead
//! and the admin channel gets a summary.

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
use crate::format::bug_url;
use crate::recorder::EventRecorder;
use crate::whiteboard::Whiteboard;

/// New bugs in configured components tagged with any meta-component.
pub fn meta_component_query(config: &OperatorConfig) -> Query {
    Query {
        classification: config.query.classification.clone(),
        product: config.query.product.clone(),
        status: vec!["NEW".to_string()],
        component: config.component_names(),
        advanced: vec![AdvancedQuery::new(
            "cf_devel_whiteboard",
            "anywordssubstr",
            &config.meta_component_names().join(","),
        )],
        include_fields: ["id", "creation_time", "status", "assigned_to", "cf_devel_whiteboard", "component"]
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

/// A planned handover of one bug to a meta-component lead.
#[derive(Debug, Clone, PartialEq)]
pub struct Reassignment {
    pub bug_id: u64,
    pub meta_component: String,
    pub lead: String,
    pub update: BugUpdate,
}

/// Plan reassignments for `bugs`.
///
/// A bug moves only while it is still assigned to the lead of its first
/// component; bugs someone already picked up are left alone. The first
/// matching meta-component in name order wins.
pub fn plan_reassignments(config: &OperatorConfig, bugs: &[Bug]) -> Vec<Reassignment> {
    let mut planned = BTreeMap::new();
    for bug in bugs {
        let tags = Whiteboard::parse(&bug.devel_whiteboard);
        let Some(component) = bug
            .component
            .first()
            .and_then(|name| config.components.get(name))
        else {
            debug!(bug_id = bug.id, components = ?bug.component, "Bug has no configured component");
            continue;
        };

        for (name, meta) in &config.meta_components {
            if !tags.contains(name) || bug.assigned_to == meta.lead {
                continue;
            }
            if bug.assigned_to != component.lead {
                continue;
            }
            planned.insert(
                bug.id,
                Reassignment {
                    bug_id: bug.id,
                    meta_component: name.clone(),
                    lead: meta.lead.clone(),
                    update: BugUpdate {
                        status: Some("ASSIGNED".to_string()),
                        assigned_to: Some(meta.lead.clone()),
                        ..BugUpdate::default()
                    },
                },
            );
            break;
        }
    }
    planned.into_values().collect()
}

/// Hands tagged bugs to their meta-component leads.
pub struct MetaComponentController {
    client: Arc<dyn BugzillaClient>,
    chat: Arc<dyn ChatClient>,
    recorder: Arc<dyn EventRecorder>,
    config: Arc<OperatorConfig>,
}

impl MetaComponentController {
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
}

#[async_trait]
impl Controller for MetaComponentController {
    fn name(&self) -> &'static str {
        "MetaComponentController"
    }

    fn resync_interval(&self) -> Duration {
        self.config.schedules.meta_component_resync_interval()
    }

    async fn sync(&self, cancel: &CancellationToken) -> Result<(), AggregateError> {
        if self.config.meta_components.is_empty() {
            debug!("No meta-components configured");
            return Ok(());
        }

        let bugs = match self.client.search(&meta_component_query(&self.config)).await {
            Ok(bugs) => bugs,
            Err(err) => {
                self.recorder
                    .warning("BuglistFailed", &format!("Failed to list bugs: {err}"));
                return Err(LifecycleError::Search(err).into());
            }
        };

        let planned = plan_reassignments(&self.config, &bugs);
        let mut errors = Vec::new();
        let mut lines = Vec::new();
        for (index, reassignment) in planned.iter().enumerate() {
            if cancel.is_cancelled() {
                errors.push(LifecycleError::Cancelled {
                    remaining: planned.len() - index,
                });
                break;
            }
            if let Err(source) = self
                .client
                .update_bug(reassignment.bug_id, &reassignment.update)
                .await
            {
                self.recorder.warning(
                    "BugUpdateFailed",
                    &format!("Failed to reassign bug #{}: {source}", reassignment.bug_id),
                );
                errors.push(LifecycleError::Update {
                    bug_id: reassignment.bug_id,
                    source,
                });
                continue;
            }
            info!(
                bug_id = reassignment.bug_id,
                meta_component = %reassignment.meta_component,
                lead = %reassignment.lead,
                "Reassigned bug"
            );
            lines.push(format!(
                "> Bug {} reassigned to {}",
                bug_url(&self.config.bugzilla_url, reassignment.bug_id),
                reassignment.lead
            ));
        }

        if !lines.is_empty() {
            let message = format!("{} bugs reassigned:\n\n{}", lines.len(), lines.join("\n"));
            if let Err(err) = self.chat.message_channel(ChannelRole::Admin, &message).await {
                self.recorder.warning(
                    "MessageFailed",
                    &format!("Reassignment summary failed to send: {err}"),
                );
                errors.push(err.into());
            }
        }
        AggregateError::into_result(errors)
    }
}
