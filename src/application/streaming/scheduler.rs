//! Scheduling primitives for the polling cycles: an injectable wall clock,
//! an injectable inter-cycle timer, and a shutdown signal honoured at each
//! sleep boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        if let Ok(mut now) = self.now.lock() {
            *now = to;
        }
    }

    pub fn advance(&self, by: chrono::Duration) {
        if let Ok(mut now) = self.now.lock() {
            *now += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        match self.now.lock() {
            Ok(now) => *now,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

/// Waits out the pause between two cycles
#[async_trait]
pub trait CycleTimer: Send + Sync {
    async fn wait(&self, interval: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl CycleTimer for TokioTimer {
    async fn wait(&self, interval: Duration) {
        tokio::time::sleep(interval).await;
    }
}

/// Sending half of the shutdown signal
#[derive(Debug, Clone)]
pub struct ShutdownTrigger {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Receiving half of the shutdown signal; cheap to clone
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested (or the trigger is dropped).
    pub async fn triggered(&mut self) {
        // An Err means every trigger was dropped, which also ends the wait.
        let _ = self.rx.wait_for(|stop| *stop).await;
    }
}

pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx: Arc::new(tx) }, ShutdownSignal { rx })
}

/// Runs `cycle` repeatedly: cycle, then wait `interval`, until shutdown.
///
/// The interval is added after each completed cycle, never subtracted from
/// its duration. Shutdown is checked before each cycle and during each wait.
/// Returns the number of completed cycles.
pub async fn run_periodic<F, Fut>(
    name: &str,
    interval: Duration,
    timer: Arc<dyn CycleTimer>,
    mut shutdown: ShutdownSignal,
    mut cycle: F,
) -> u64
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut completed = 0u64;
    info!("{} loop started (interval: {:?})", name, interval);

    loop {
        if shutdown.is_triggered() {
            break;
        }

        cycle().await;
        completed += 1;
        debug!("{} cycle #{} complete", name, completed);

        tokio::select! {
            _ = timer.wait(interval) => {}
            _ = shutdown.triggered() => break,
        }
    }

    info!("{} loop stopped after {} cycles", name, completed);
    completed
}
