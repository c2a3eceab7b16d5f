//! Periodic controller driver.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::error::AggregateError;

/// A reconciler run on a fixed interval.
#[async_trait]
pub trait Controller: Send + Sync {
    fn name(&self) -> &'static str;

    fn resync_interval(&self) -> Duration;

    /// Run one pass. Implementations check `cancel` between bugs.
    async fn sync(&self, cancel: &CancellationToken) -> Result<(), AggregateError>;
}

/// Shortest period a controller is resynced with.
const MIN_RESYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Run `controller` immediately and then every resync interval until
/// `cancel` fires. Pass failures are logged, never fatal.
pub async fn run_controller(controller: Arc<dyn Controller>, cancel: CancellationToken) {
    let name = controller.name();
    let interval = controller.resync_interval().max(MIN_RESYNC_INTERVAL);
    info!(controller = name, interval_secs = interval.as_secs(), "Starting controller");

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(controller = name, "Stopping controller");
                return;
            }
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        match controller.sync(&cancel).await {
            Ok(()) => info!(
                controller = name,
                elapsed_ms = started.elapsed().as_millis(),
                "Sync completed"
            ),
            Err(err) => error!(
                controller = name,
                failures = err.len(),
                error = %err,
                "Sync finished with errors"
            ),
        }
    }
}

/// Drive every controller concurrently until `cancel` fires.
pub async fn run_controllers(controllers: Vec<Arc<dyn Controller>>, cancel: CancellationToken) {
    futures::future::join_all(
        controllers
            .into_iter()
            .map(|controller| run_controller(controller, cancel.clone())),
    )
    .await;
}
