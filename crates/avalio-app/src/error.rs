//! Startup error types.

use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Errors that abort startup. Nothing has been spawned when one is returned.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] avalio_core::ConfigError),

    #[error("monitor {monitor}: {source}")]
    Schedule {
        monitor: String,
        #[source]
        source: avalio_schedule::ScheduleError,
    },

    #[error(transparent)]
    Resource(#[from] avalio_health::ResourceError),

    #[error("notificator error: {0}")]
    Notify(#[from] avalio_notify::NotifyError),

    #[error("monitor {monitor}: resource {name:?} doesn't exist")]
    UnknownResource { monitor: String, name: String },

    #[error("monitor {monitor}: notificator {name:?} doesn't exist")]
    UnknownNotificator { monitor: String, name: String },

    #[error("duplicated resource name: {0}")]
    DuplicateResource(String),

    #[error("duplicated notificator name: {0}")]
    DuplicateNotificator(String),
}
