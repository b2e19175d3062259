//! Two-cadence periodic scheduler.
//!
//! Drives the ticker cycle every five minutes and the mining cycle every
//! ten. The cycles are independent and may overlap each other; each is
//! internally sequential. A failed cycle is logged and retried on the next
//! tick, carrying no state forward.

use crate::cycles::SnapshotRunner;
use anyhow::Result;
use cointick_core::AppConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

pub struct SnapshotScheduler {
    runner: Arc<SnapshotRunner>,
    ticker_interval: Duration,
    mining_interval: Duration,
}

impl SnapshotScheduler {
    /// Creates a scheduler from application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying runner cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            runner: Arc::new(SnapshotRunner::new(config)?),
            ticker_interval: Duration::from_secs(config.poller.ticker_interval_secs),
            mining_interval: Duration::from_secs(config.poller.mining_interval_secs),
        })
    }

    /// Runs both cycles on their cadences until the process is stopped.
    ///
    /// # Errors
    ///
    /// Returns an error only if a scheduler task panics; cycle failures are
    /// logged and do not stop the loop.
    pub async fn start(self) -> Result<()> {
        info!(
            ticker_interval_secs = self.ticker_interval.as_secs(),
            mining_interval_secs = self.mining_interval.as_secs(),
            "Starting snapshot scheduler"
        );

        let ticker_runner = self.runner.clone();
        let ticker_task = tokio::spawn(run_loop(
            ticker_runner,
            self.ticker_interval,
            CycleKind::Ticker,
        ));
        let mining_task = tokio::spawn(run_loop(
            self.runner,
            self.mining_interval,
            CycleKind::Mining,
        ));

        let (ticker_result, mining_result) = tokio::join!(ticker_task, mining_task);
        ticker_result?;
        mining_result?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum CycleKind {
    Ticker,
    Mining,
}

async fn run_loop(runner: Arc<SnapshotRunner>, period: Duration, kind: CycleKind) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        let result = match kind {
            CycleKind::Ticker => runner.ticker_cycle().await,
            CycleKind::Mining => runner.mining_cycle().await,
        };
        if let Err(e) = result {
            error!(cycle = ?kind, error = %e, "Snapshot cycle failed");
        }
    }
}
