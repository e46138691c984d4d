//! Monitor runner — the check loop for one (monitor, resource) pair.
//!
//! Each cycle: check the resource, classify the verdict, hand the result to
//! every bound notificator queue in order, then sleep until the schedule's
//! next instant. A full queue blocks the runner until it accepts the
//! result, so a stalled notificator only stalls the runners bound to it.

use std::sync::Arc;

use chrono::{DateTime, Local, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use avalio_core::{CheckResult, ResourceState};
use avalio_schedule::Schedule;

use crate::resource::Resource;
use crate::tracker::StateTracker;

/// A notificator queue the runner delivers to.
#[derive(Debug, Clone)]
pub struct Destination {
    pub notificator: String,
    pub queue: mpsc::Sender<CheckResult>,
}

impl Destination {
    pub fn new(notificator: impl Into<String>, queue: mpsc::Sender<CheckResult>) -> Self {
        Self {
            notificator: notificator.into(),
            queue,
        }
    }
}

/// Wall-clock source the runner plans its next wake-up from.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;
}

/// The system's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

pub struct MonitorRunner {
    monitor: String,
    resource: Arc<dyn Resource>,
    schedule: Arc<Schedule>,
    destinations: Vec<Destination>,
    tracker: StateTracker,
    clock: Arc<dyn Clock>,
}

impl MonitorRunner {
    pub fn new(
        monitor: impl Into<String>,
        resource: Arc<dyn Resource>,
        schedule: Arc<Schedule>,
        destinations: Vec<Destination>,
    ) -> Self {
        Self {
            monitor: monitor.into(),
            resource,
            schedule,
            destinations,
            tracker: StateTracker::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the wall clock used to compute the next run.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Run one check and classify it. Does not deliver.
    pub async fn step(&mut self) -> CheckResult {
        let resource = self.resource.name();
        debug!(monitor = %self.monitor, %resource, "checking resource");

        let outcome = self.resource.check().await;
        let state = self.tracker.record(outcome.ok);

        match state {
            ResourceState::Available => {
                info!(monitor = %self.monitor, %resource, "resource available");
            }
            ResourceState::Recovered => {
                info!(monitor = %self.monitor, %resource, "resource recovered");
            }
            ResourceState::NotAvailable => {
                warn!(
                    monitor = %self.monitor,
                    %resource,
                    details = ?outcome.details,
                    "resource not available"
                );
            }
            ResourceState::StillNotAvailable => {
                warn!(
                    monitor = %self.monitor,
                    %resource,
                    details = ?outcome.details,
                    "resource still not available"
                );
            }
        }

        CheckResult {
            resource_name: resource.to_string(),
            resource_kind: self.resource.kind().to_string(),
            monitor_name: self.monitor.clone(),
            state,
            details: outcome.details,
            checked_at: Utc::now(),
        }
    }

    /// Loop until shutdown. The first check runs immediately.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            monitor = %self.monitor,
            resource = %self.resource.name(),
            schedule = %self.schedule,
            "starting resource monitor"
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            let result = self.step().await;
            let state = result.state;

            if !self.deliver(result, &mut shutdown).await {
                break;
            }

            let now = self.clock.now();
            let Some(next) = self.schedule.next_after(&now) else {
                error!(
                    monitor = %self.monitor,
                    schedule = %self.schedule,
                    "schedule has no upcoming run, stopping monitor"
                );
                break;
            };
            let wait = (next - now).to_std().unwrap_or_default();

            debug!(
                monitor = %self.monitor,
                resource = %self.resource.name(),
                %state,
                next_run = %next,
                "check result delivered"
            );

            tokio::select! {
                _ = tokio::time::sleep(wait) => {}
                _ = shutdown.changed() => break,
            }
        }

        debug!(monitor = %self.monitor, resource = %self.resource.name(), "monitor runner stopped");
    }

    /// Hand the result to every destination in order. Returns `false` if
    /// shutdown arrived while waiting on a queue.
    async fn deliver(&self, result: CheckResult, shutdown: &mut watch::Receiver<bool>) -> bool {
        for dest in &self.destinations {
            tokio::select! {
                sent = dest.queue.send(result.clone()) => {
                    if sent.is_err() {
                        warn!(
                            monitor = %self.monitor,
                            notificator = %dest.notificator,
                            "notificator queue closed, result dropped"
                        );
                    }
                }
                _ = shutdown.changed() => return false,
            }
        }
        true
    }
}
