//! Health check error types.

use std::time::Duration;

use thiserror::Error;

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors raised while building a resource from its parameters.
///
/// Check failures are never errors; they fold into a failed
/// [`CheckOutcome`](crate::CheckOutcome).
#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource {name}: invalid parameter: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("resource {name}: failed to build http client: {source}")]
    Client {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Config(#[from] avalio_core::ConfigError),
}

/// Why a single echo probe got no reply.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out waiting for reply after {0:?}")]
    Timeout(Duration),

    #[error("ping failed: {0}")]
    Failed(String),

    #[error("failed to run ping: {0}")]
    Spawn(#[from] std::io::Error),
}
