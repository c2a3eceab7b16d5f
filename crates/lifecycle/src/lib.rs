//! Bug lifecycle controllers.
//!
//! Three controllers share one Bugzilla client and one chat client:
//!
//! - [`StaleController`] degrades and tags bugs without significant
//!   activity, then tells their assignees and creators
//! - [`MetaComponentController`] hands tagged new bugs to meta-component leads
//! - [`IncomingReporter`] announces unreported bugs to their assignees
//!
//! [`run_controllers`] drives them on their resync intervals until a
//! cancellation token fires.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod controller;
pub mod error;
pub mod format;
pub mod history;
pub mod incoming;
pub mod keywords;
pub mod metacomponent;
pub mod mutation;
pub mod notification;
pub mod priority;
pub mod recorder;
pub mod stale;
pub mod whiteboard;

pub use controller::{run_controller, run_controllers, Controller};
pub use error::{AggregateError, LifecycleError};
pub use format::{bug_url, format_bug_message};
pub use incoming::IncomingReporter;
pub use keywords::NoiseFilter;
pub use metacomponent::MetaComponentController;
pub use notification::{NotificationBatch, NOTIFICATION_EXCLUDED_BUG_ID};
pub use recorder::{EventRecorder, TracingRecorder};
pub use stale::StaleController;
pub use whiteboard::Whiteboard;
