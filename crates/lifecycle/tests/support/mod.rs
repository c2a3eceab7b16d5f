//! In-memory Bugzilla, chat and recorder doubles.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bugzilla::{Bug, BugUpdate, BugzillaClient, Comment, HistoryChange, Query, TrackerError};
use chrono::{DateTime, Duration, Utc};
use config::OperatorConfig;
use lifecycle::EventRecorder;
use notify::{ChannelError, ChannelRole, ChatClient};
use tokio_util::sync::CancellationToken;

pub const STALE_COMMENT: &str = "This bug hasn't had any activity in the last 30 days.";

pub fn now() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2020-06-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn days_ago(days: i64) -> String {
    (now() - Duration::days(days)).to_rfc3339()
}

pub fn config() -> Arc<OperatorConfig> {
    let yaml = format!(
        r#"
bugzillaUrl: https://bugzilla.example.com
staleBugComment: "{STALE_COMMENT}"
components:
  etcd:
    lead: etcd-lead@example.com
  networking:
    lead: net-lead@example.com
metaComponents:
  ovn:
    lead: ovn-lead@example.com
slack:
  adminChannel: CADMIN
  statusChannel: CSTATUS
"#
    );
    Arc::new(OperatorConfig::from_yaml_str(&yaml).unwrap())
}

/// A 40 day old bug with no comments.
pub fn old_bug(id: u64) -> Bug {
    Bug {
        id,
        summary: format!("bug {id}"),
        status: "NEW".to_string(),
        severity: "medium".to_string(),
        priority: bugzilla::Priority::High,
        creation_time: days_ago(40),
        last_change_time: days_ago(40),
        assigned_to: "dev@example.com".to_string(),
        creator: "qe@example.com".to_string(),
        component: vec!["etcd".to_string()],
        ..Bug::default()
    }
}

pub fn comment(count: u32, time: String, text: &str) -> Comment {
    Comment {
        count,
        text: text.to_string(),
        time,
        creator: "someone@example.com".to_string(),
    }
}

#[derive(Default)]
pub struct FakeBugzilla {
    pub search_results: Mutex<Vec<Bug>>,
    pub full_bugs: Mutex<HashMap<u64, Bug>>,
    pub comments: Mutex<HashMap<u64, Vec<Comment>>>,
    pub history: Mutex<HashMap<u64, Vec<HistoryChange>>>,
    pub failing_updates: Mutex<HashSet<u64>>,
    pub failing_comments: Mutex<HashSet<u64>>,
    pub fail_search: Mutex<bool>,
    pub updates: Mutex<Vec<(u64, BugUpdate)>>,
    pub searches: Mutex<Vec<Query>>,
    pub fetched: Mutex<Vec<u64>>,
    /// Cancelled right after the first successful update.
    pub cancel_after_update: Mutex<Option<CancellationToken>>,
}

impl FakeBugzilla {
    pub fn with_bugs(bugs: Vec<Bug>) -> Arc<Self> {
        let fake = Self::default();
        *fake.search_results.lock().unwrap() = bugs;
        Arc::new(fake)
    }

    pub fn set_comments(&self, id: u64, comments: Vec<Comment>) {
        self.comments.lock().unwrap().insert(id, comments);
    }

    pub fn set_history(&self, id: u64, history: Vec<HistoryChange>) {
        self.history.lock().unwrap().insert(id, history);
    }

    pub fn set_full_bug(&self, bug: Bug) {
        self.full_bugs.lock().unwrap().insert(bug.id, bug);
    }

    pub fn fail_update(&self, id: u64) {
        self.failing_updates.lock().unwrap().insert(id);
    }

    pub fn fail_comments(&self, id: u64) {
        self.failing_comments.lock().unwrap().insert(id);
    }

    pub fn updates(&self) -> Vec<(u64, BugUpdate)> {
        self.updates.lock().unwrap().clone()
    }

    pub fn updated_ids(&self) -> Vec<u64> {
        self.updates().into_iter().map(|(id, _)| id).collect()
    }
}

#[async_trait]
impl BugzillaClient for FakeBugzilla {
    async fn search(&self, query: &Query) -> Result<Vec<Bug>, TrackerError> {
        self.searches.lock().unwrap().push(query.clone());
        if *self.fail_search.lock().unwrap() {
            return Err(TrackerError::Api {
                status: 500,
                message: "search exploded".to_string(),
            });
        }
        Ok(self.search_results.lock().unwrap().clone())
    }

    async fn get_bug(&self, id: u64) -> Result<Bug, TrackerError> {
        self.fetched.lock().unwrap().push(id);
        self.full_bugs
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(TrackerError::NotFound(id))
    }

    async fn update_bug(&self, id: u64, update: &BugUpdate) -> Result<(), TrackerError> {
        if self.failing_updates.lock().unwrap().contains(&id) {
            return Err(TrackerError::Api {
                status: 400,
                message: "flag not allowed".to_string(),
            });
        }
        self.updates.lock().unwrap().push((id, update.clone()));
        if let Some(token) = self.cancel_after_update.lock().unwrap().take() {
            token.cancel();
        }
        Ok(())
    }

    async fn get_cached_comments(&self, id: u64, _hint: &str) -> Result<Vec<Comment>, TrackerError> {
        if self.failing_comments.lock().unwrap().contains(&id) {
            return Err(TrackerError::Api {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        Ok(self
            .comments
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_cached_history(
        &self,
        id: u64,
        _hint: &str,
    ) -> Result<Vec<HistoryChange>, TrackerError> {
        Ok(self
            .history
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeChat {
    pub direct: Mutex<Vec<(String, String)>>,
    pub channel: Mutex<Vec<(ChannelRole, String)>>,
    pub failing_recipients: Mutex<HashSet<String>>,
    pub fail_channels: Mutex<bool>,
}

impl FakeChat {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_for(&self, recipient: &str) {
        self.failing_recipients
            .lock()
            .unwrap()
            .insert(recipient.to_string());
    }

    pub fn direct(&self) -> Vec<(String, String)> {
        self.direct.lock().unwrap().clone()
    }

    pub fn recipients(&self) -> Vec<String> {
        self.direct().into_iter().map(|(to, _)| to).collect()
    }

    pub fn message_for(&self, recipient: &str) -> Option<String> {
        self.direct()
            .into_iter()
            .find(|(to, _)| to == recipient)
            .map(|(_, text)| text)
    }

    pub fn channel(&self) -> Vec<(ChannelRole, String)> {
        self.channel.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatClient for FakeChat {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn message_user(&self, email: &str, text: &str) -> Result<(), ChannelError> {
        if self.failing_recipients.lock().unwrap().contains(email) {
            return Err(ChannelError::Api {
                method: "users.lookupByEmail".to_string(),
                error: "users_not_found".to_string(),
            });
        }
        self.direct
            .lock()
            .unwrap()
            .push((email.to_string(), text.to_string()));
        Ok(())
    }

    async fn message_channel(&self, role: ChannelRole, text: &str) -> Result<(), ChannelError> {
        if *self.fail_channels.lock().unwrap() {
            return Err(ChannelError::Other("channel_not_found".to_string()));
        }
        self.channel.lock().unwrap().push((role, text.to_string()));
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Warning { reason: String, message: String },
    Event { reason: String, message: String },
}

#[derive(Default)]
pub struct MemoryRecorder {
    pub recorded: Mutex<Vec<Recorded>>,
}

impl MemoryRecorder {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn warnings(&self, reason: &str) -> Vec<String> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter_map(|entry| match entry {
                Recorded::Warning { reason: r, message } if r == reason => Some(message.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self, reason: &str) -> Vec<String> {
        self.recorded
            .lock()
            .unwrap()
            .iter()
            .filter_map(|entry| match entry {
                Recorded::Event { reason: r, message } if r == reason => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

impl EventRecorder for MemoryRecorder {
    fn warning(&self, reason: &str, message: &str) {
        self.recorded.lock().unwrap().push(Recorded::Warning {
            reason: reason.to_string(),
            message: message.to_string(),
        });
    }

    fn event(&self, reason: &str, message: &str) {
        self.recorded.lock().unwrap().push(Recorded::Event {
            reason: reason.to_string(),
            message: message.to_string(),
        });
    }
}
