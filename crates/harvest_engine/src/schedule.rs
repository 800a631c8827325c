use std::time::Duration;

use harvest_logging::{harvest_error, harvest_info};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::harvest::Harvester;
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub interval: Duration,
    pub run_at_startup: bool,
}

impl Schedule {
    /// Longest interval the scheduler waits between runs; longer ones are
    /// clamped to it.
    pub const MAX_INTERVAL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

    pub fn every_hours(hours: u64, run_at_startup: bool) -> Self {
        Self {
            interval: Duration::from_secs(hours.saturating_mul(60 * 60)),
            run_at_startup,
        }
    }
}

/// Triggers a harvest every `schedule.interval` until `shutdown` fires.
///
/// Runs never overlap: a tick that comes due while a run is still going is
/// dropped. Cancelling `shutdown` also stops an in-flight run at its next
/// page boundary, after which that run still commits. Returns the number of
/// runs started.
pub async fn run_periodic(
    harvester: &Harvester,
    store: &mut Store,
    schedule: Schedule,
    shutdown: CancellationToken,
) -> usize {
    let period = schedule
        .interval
        .clamp(Duration::from_millis(1), Schedule::MAX_INTERVAL);
    let start = if schedule.run_at_startup {
        Instant::now()
    } else {
        Instant::now() + period
    };
    let mut ticker = interval_at(start, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut runs = 0;
    loop {
        tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        runs += 1;
        if let Err(err) = harvester.execute(store, &shutdown).await {
            harvest_error!("Harvest run {} failed: {}", runs, err);
        }
    }
    harvest_info!("Scheduler stopped after {} runs", runs);
    runs
}
