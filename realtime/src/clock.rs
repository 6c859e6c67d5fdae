//! Synchronised clock: periodically tells every client the relay's current time.

use crate::message::CLOCK_EVENT;
use crate::Manager;
use log::*;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Spawns the ticker on the current runtime. It runs until `shutdown` is cancelled.
pub fn spawn(
    manager: Arc<Manager>,
    period: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(run(manager, period, shutdown))
}

/// Broadcasts a `synchronisedClock.time` event every `period`, the first one a
/// full period after start. Ticks are not corrected for drift.
pub async fn run(manager: Arc<Manager>, period: Duration, shutdown: CancellationToken) {
    if period.is_zero() {
        error!("Synchronised clock disabled: the tick interval must be greater than zero");
        return;
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!("Synchronised clock ticking every {}ms", period.as_millis());

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("Synchronised clock stopped");
                return;
            }
            _ = ticker.tick() => {
                let now = chrono::Utc::now().timestamp_millis();
                manager.broadcast(CLOCK_EVENT, &Value::from(now));
            }
        }
    }
}
