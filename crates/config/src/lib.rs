//! Operator configuration.
//!
//! Loaded once at startup from a YAML file and treated as read-only by every
//! controller. Secrets (API keys, bot tokens) are not part of this file.
//!
//! ```yaml
//! staleBugComment: |
//!   This bug hasn't had any activity in the last 30 days ...
//! components:
//!   kube-apiserver:
//!     lead: lead@example.com
//!     developers: ["group:api-auth"]
//! groups:
//!   api-auth: ["dev1@example.com", "dev2@example.com"]
//! stale:
//!   minimumStaleDays: 30
//! slack:
//!   adminChannel: C0ADMIN
//!   statusChannel: C0STATUS
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::time::Duration;

use bugzilla::Priority;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Prefix marking a developer entry as a group reference.
const GROUP_PREFIX: &str = "group:";

/// Largest accepted `stale.minimumStaleDays` (about a century).
pub const MAX_MINIMUM_STALE_DAYS: u32 = 36_500;

/// A period given in minutes, saturating instead of overflowing.
#[must_use]
pub fn minutes(value: u64) -> Duration {
    Duration::from_secs(value.saturating_mul(60))
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// Config file is not valid YAML for [`OperatorConfig`]
    #[error("Failed to parse config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Config parsed but failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A named list of e-mail addresses.
pub type Group = Vec<String>;

/// Ownership of a Bugzilla component (or meta-component).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Component {
    /// Default assignee of the component.
    pub lead: String,

    /// Developers; entries may be `group:<name>` references.
    #[serde(default)]
    pub developers: Vec<String>,
}

/// One step of the priority degradation path.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Transition {
    pub from: Priority,
    pub to: Priority,
}

/// Stale bug rule settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StaleConfig {
    /// Days without significant change before a bug is stale.
    #[serde(default = "default_minimum_stale_days")]
    pub minimum_stale_days: u32,

    /// Priority degradation path, looked up by exact `from` match.
    #[serde(default = "default_priority_transitions")]
    pub priority_transitions: Vec<Transition>,

    /// Account the `blocker-` flag change is addressed to.
    #[serde(default = "default_blocker_triage_owner")]
    pub blocker_triage_owner: String,

    /// How often the stale controller runs.
    #[serde(default = "default_stale_resync_minutes")]
    pub resync_minutes: u64,
}

/// Scope every candidate search is restricted to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryScope {
    #[serde(default = "default_classification")]
    pub classification: Vec<String>,

    #[serde(default = "default_product")]
    pub product: Vec<String>,
}

/// Slack targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlackConfig {
    #[serde(default)]
    pub admin_channel: String,

    #[serde(default)]
    pub status_channel: String,

    /// Send every direct message to the admin channel instead.
    #[serde(default)]
    pub debug: bool,
}

/// Resync intervals of the auxiliary controllers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleConfig {
    #[serde(default = "default_meta_component_resync_minutes")]
    pub meta_component_resync_minutes: u64,

    #[serde(default = "default_incoming_resync_minutes")]
    pub incoming_resync_minutes: u64,
}

/// Main operator configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorConfig {
    /// Bugzilla instance used for API calls and bug links.
    #[serde(default = "default_bugzilla_url")]
    pub bugzilla_url: String,

    /// Comment posted when a bug is marked stale.
    pub stale_bug_comment: String,

    #[serde(default)]
    pub components: BTreeMap<String, Component>,

    /// Keyed by the keyword looked for in the developer whiteboard.
    #[serde(default)]
    pub meta_components: BTreeMap<String, Component>,

    #[serde(default)]
    pub groups: BTreeMap<String, Group>,

    #[serde(default)]
    pub stale: StaleConfig,

    #[serde(default)]
    pub query: QueryScope,

    #[serde(default)]
    pub slack: SlackConfig,

    #[serde(default)]
    pub schedules: ScheduleConfig,
}

fn default_bugzilla_url() -> String {
    "https://bugzilla.redhat.com".to_string()
}

fn default_minimum_stale_days() -> u32 {
    30
}

fn default_priority_transitions() -> Vec<Transition> {
    vec![
        Transition {
            from: Priority::High,
            to: Priority::Medium,
        },
        Transition {
            from: Priority::Medium,
            to: Priority::Low,
        },
        Transition {
            from: Priority::Unspecified,
            to: Priority::Low,
        },
    ]
}

fn default_blocker_triage_owner() -> String {
    "eparis".to_string()
}

fn default_stale_resync_minutes() -> u64 {
    60
}

fn default_classification() -> Vec<String> {
    vec!["Red Hat".to_string()]
}

fn default_product() -> Vec<String> {
    vec!["OpenShift Container Platform".to_string()]
}

fn default_meta_component_resync_minutes() -> u64 {
    180
}

fn default_incoming_resync_minutes() -> u64 {
    720
}

impl Default for StaleConfig {
    fn default() -> Self {
        Self {
            minimum_stale_days: default_minimum_stale_days(),
            priority_transitions: default_priority_transitions(),
            blocker_triage_owner: default_blocker_triage_owner(),
            resync_minutes: default_stale_resync_minutes(),
        }
    }
}

impl Default for QueryScope {
    fn default() -> Self {
        Self {
            classification: default_classification(),
            product: default_product(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            meta_component_resync_minutes: default_meta_component_resync_minutes(),
            incoming_resync_minutes: default_incoming_resync_minutes(),
        }
    }
}

impl StaleConfig {
    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        minutes(self.resync_minutes)
    }
}

impl ScheduleConfig {
    #[must_use]
    pub fn meta_component_resync_interval(&self) -> Duration {
        minutes(self.meta_component_resync_minutes)
    }

    #[must_use]
    pub fn incoming_resync_interval(&self) -> Duration {
        minutes(self.incoming_resync_minutes)
    }
}

impl OperatorConfig {
    /// Load configuration from a YAML file and validate it.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse configuration from YAML text and validate it.
    ///
    /// # Errors
    /// Returns an error if the text cannot be parsed or validated.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(contents)?;
        config.validate()?;
        debug!(
            components = config.components.len(),
            meta_components = config.meta_components.len(),
            "Loaded operator configuration"
        );
        Ok(config)
    }

    /// Validate that configuration is usable.
    ///
    /// # Errors
    /// Returns [`ConfigError::Invalid`] describing the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stale_bug_comment.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "staleBugComment must not be empty".to_string(),
            ));
        }

        if !(1..=MAX_MINIMUM_STALE_DAYS).contains(&self.stale.minimum_stale_days) {
            return Err(ConfigError::Invalid(format!(
                "stale.minimumStaleDays must be between 1 and {MAX_MINIMUM_STALE_DAYS}"
            )));
        }

        let periods = [
            ("stale.resyncMinutes", self.stale.resync_minutes),
            (
                "schedules.metaComponentResyncMinutes",
                self.schedules.meta_component_resync_minutes,
            ),
            (
                "schedules.incomingResyncMinutes",
                self.schedules.incoming_resync_minutes,
            ),
        ];
        if let Some((key, _)) = periods.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::Invalid(format!("{key} must be at least 1")));
        }

        if let Some(t) = self
            .stale
            .priority_transitions
            .iter()
            .find(|t| t.from == t.to)
        {
            return Err(ConfigError::Invalid(format!(
                "priority transition {} -> {} does not change the priority",
                t.from, t.to
            )));
        }

        let mut unknown_groups = BTreeSet::new();
        for component in self.components.values().chain(self.meta_components.values()) {
            for developer in &component.developers {
                if let Some(group) = developer.strip_prefix(GROUP_PREFIX) {
                    if !self.groups.contains_key(group) {
                        unknown_groups.insert(group.to_string());
                    }
                }
            }
        }
        if !unknown_groups.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "unknown groups referenced by components: {}",
                unknown_groups.into_iter().collect::<Vec<_>>().join(", ")
            )));
        }

        Ok(())
    }

    /// Names of all configured components.
    #[must_use]
    pub fn component_names(&self) -> Vec<String> {
        self.components.keys().cloned().collect()
    }

    /// Names of all configured meta-components.
    #[must_use]
    pub fn meta_component_names(&self) -> Vec<String> {
        self.meta_components.keys().cloned().collect()
    }

    /// Developers of a component with `group:` references expanded, deduplicated.
    #[must_use]
    pub fn expand_developers(&self, component: &Component) -> Vec<String> {
        let mut developers = BTreeSet::new();
        for entry in &component.developers {
            match entry.strip_prefix(GROUP_PREFIX) {
                Some(group) => {
                    if let Some(members) = self.groups.get(group) {
                        developers.extend(members.iter().cloned());
                    }
                }
                None => {
                    developers.insert(entry.clone());
                }
            }
        }
        developers.into_iter().collect()
    }
}
