//! Background scheduler for periodic rate refreshes.

use crate::core::refresh::RateRefresher;
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, info, warn};

/// Refresh interval: 1 hour
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 60 * 60;

/// Decides when the next refresh runs.
#[async_trait]
pub trait Ticker: Send + 'static {
    /// Waits for the next tick. Returns `false` when no more ticks will come.
    async fn tick(&mut self) -> bool;
}

/// Fixed-rate ticker. The first tick fires one period after creation since
/// the initial refresh happens at startup.
pub struct IntervalTicker {
    interval: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval }
    }
}

#[async_trait]
impl Ticker for IntervalTicker {
    async fn tick(&mut self) -> bool {
        self.interval.tick().await;
        true
    }
}

/// Ticks whenever the paired [`ManualTrigger`] fires.
pub struct ManualTicker {
    rx: mpsc::Receiver<()>,
}

#[derive(Clone)]
pub struct ManualTrigger {
    tx: mpsc::Sender<()>,
}

impl ManualTicker {
    pub fn new() -> (ManualTrigger, ManualTicker) {
        let (tx, rx) = mpsc::channel(8);
        (ManualTrigger { tx }, ManualTicker { rx })
    }
}

impl ManualTrigger {
    pub async fn fire(&self) {
        // The ticker going away means the scheduler already stopped.
        let _ = self.tx.send(()).await;
    }
}

#[async_trait]
impl Ticker for ManualTicker {
    async fn tick(&mut self) -> bool {
        self.rx.recv().await.is_some()
    }
}

/// Handle to a running scheduler. Dropping it also ends the loop.
pub struct SchedulerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stops the loop and waits for it to exit. A refresh in flight is
    /// allowed to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = self.task.await {
            warn!(error = %e, "Rate refresh scheduler task failed");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

pub struct RefreshScheduler;

impl RefreshScheduler {
    /// Spawns the refresh loop. Every tick runs one refresh whatever the
    /// outcome of the previous one.
    pub fn start<T: Ticker>(refresher: RateRefresher, mut ticker: T) -> SchedulerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel();

        let task = tokio::spawn(async move {
            info!("Rate refresh scheduler started");
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    more = ticker.tick() => {
                        if !more {
                            debug!("Ticker exhausted");
                            break;
                        }
                        refresher.refresh_logged().await;
                    }
                }
            }
            info!("Rate refresh scheduler stopped");
        });

        SchedulerHandle {
            stop_tx: Some(stop_tx),
            task,
        }
    }

    pub fn start_interval(refresher: RateRefresher, period: Duration) -> SchedulerHandle {
        info!(period_secs = period.as_secs(), "Scheduling rate refresh");
        Self::start(refresher, IntervalTicker::new(period))
    }
}
