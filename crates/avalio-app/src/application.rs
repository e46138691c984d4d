//! Application assembly and task lifecycle.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{error, info};

use avalio_core::{AvalioConfig, CheckResult};
use avalio_health::{Destination, MonitorRunner, ProbeLock, Resource, SystemPing};
use avalio_notify::Notificator;
use avalio_schedule::Schedule;

use crate::error::{AppError, AppResult};
use crate::factory;
use crate::listener::listen;

/// Capacity of each notificator queue. A runner blocks on handoff as soon
/// as the listener is one result behind.
const QUEUE_CAPACITY: usize = 1;

/// A named schedule bound to resources and notificators by name.
#[derive(Debug, Clone)]
pub struct Monitor {
    pub name: String,
    pub schedule: Arc<Schedule>,
    pub resources: Vec<String>,
    pub notificators: Vec<String>,
}

impl Monitor {
    pub fn new<R, N>(
        name: impl Into<String>,
        schedule: Schedule,
        resources: R,
        notificators: N,
    ) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            name: name.into(),
            schedule: Arc::new(schedule),
            resources: resources.into_iter().map(Into::into).collect(),
            notificators: notificators.into_iter().map(Into::into).collect(),
        }
    }
}

/// One runner to spawn: a monitor applied to a single resource.
struct Binding {
    monitor: String,
    schedule: Arc<Schedule>,
    resource: Arc<dyn Resource>,
    notificators: Vec<String>,
}

pub struct Application {
    resources: Vec<Arc<dyn Resource>>,
    notificators: Vec<Arc<dyn Notificator>>,
    monitors: Vec<Monitor>,
}

impl Application {
    pub fn new(
        resources: Vec<Arc<dyn Resource>>,
        notificators: Vec<Arc<dyn Notificator>>,
        monitors: Vec<Monitor>,
    ) -> Self {
        Self {
            resources,
            notificators,
            monitors,
        }
    }

    /// Build every resource, notificator and schedule from a validated
    /// config. Ping resources share one probe lock and the system `ping`.
    pub fn from_config(config: &AvalioConfig) -> AppResult<Self> {
        let resources = factory::build_resources(
            &config.resources,
            Arc::new(SystemPing::new()),
            ProbeLock::new(),
        )?;
        let notificators = factory::build_notificators(&config.notificators)?;
        let monitors = factory::build_monitors(&config.monitors)?;
        Ok(Self::new(resources, notificators, monitors))
    }

    pub fn resources(&self) -> &[Arc<dyn Resource>] {
        &self.resources
    }

    pub fn notificators(&self) -> &[Arc<dyn Notificator>] {
        &self.notificators
    }

    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    /// Resolve every reference without starting anything.
    pub fn check(&self) -> AppResult<()> {
        self.resolve().map(|_| ())
    }

    /// Spawn one listener per notificator and one runner per
    /// monitor × resource pairing.
    ///
    /// All names are resolved first; on error nothing has been spawned.
    /// Must be called from within a tokio runtime.
    pub fn start(self, shutdown: watch::Receiver<bool>) -> AppResult<Running> {
        let bindings = self.resolve()?;

        let mut queues: HashMap<String, mpsc::Sender<CheckResult>> = HashMap::new();
        let mut listeners = Vec::with_capacity(self.notificators.len());
        for notificator in &self.notificators {
            let (tx, rx) = mpsc::channel(QUEUE_CAPACITY);
            queues.insert(notificator.name().to_string(), tx);
            listeners.push(tokio::spawn(listen(
                notificator.clone(),
                rx,
                shutdown.clone(),
            )));
        }

        let mut runners = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let destinations = binding
                .notificators
                .iter()
                .filter_map(|name| {
                    queues
                        .get(name)
                        .map(|queue| Destination::new(name.clone(), queue.clone()))
                })
                .collect();
            let runner = MonitorRunner::new(
                binding.monitor,
                binding.resource,
                binding.schedule,
                destinations,
            );
            runners.push(tokio::spawn(runner.run(shutdown.clone())));
        }

        info!(
            runners = runners.len(),
            listeners = listeners.len(),
            "monitors started"
        );

        Ok(Running { runners, listeners })
    }

    fn resolve(&self) -> AppResult<Vec<Binding>> {
        let mut resources: HashMap<&str, &Arc<dyn Resource>> = HashMap::new();
        for resource in &self.resources {
            if resources.insert(resource.name(), resource).is_some() {
                return Err(AppError::DuplicateResource(resource.name().to_string()));
            }
        }

        let mut notificators = HashSet::new();
        for notificator in &self.notificators {
            if !notificators.insert(notificator.name()) {
                return Err(AppError::DuplicateNotificator(
                    notificator.name().to_string(),
                ));
            }
        }

        let mut bindings = Vec::new();
        for monitor in &self.monitors {
            for name in &monitor.notificators {
                if !notificators.contains(name.as_str()) {
                    return Err(AppError::UnknownNotificator {
                        monitor: monitor.name.clone(),
                        name: name.clone(),
                    });
                }
            }

            for name in &monitor.resources {
                let resource =
                    resources
                        .get(name.as_str())
                        .ok_or_else(|| AppError::UnknownResource {
                            monitor: monitor.name.clone(),
                            name: name.clone(),
                        })?;
                bindings.push(Binding {
                    monitor: monitor.name.clone(),
                    schedule: monitor.schedule.clone(),
                    resource: Arc::clone(*resource),
                    notificators: monitor.notificators.clone(),
                });
            }
        }

        Ok(bindings)
    }
}

/// Handles to the spawned tasks.
pub struct Running {
    runners: Vec<JoinHandle<()>>,
    listeners: Vec<JoinHandle<()>>,
}

impl Running {
    pub fn runner_count(&self) -> usize {
        self.runners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Wait for every runner, then every listener, to finish.
    pub async fn wait(self) {
        for handle in self.runners.into_iter().chain(self.listeners) {
            if let Err(e) = handle.await {
                error!(error = %e, "monitor task failed");
            }
        }
        info!("all monitors stopped");
    }
}
