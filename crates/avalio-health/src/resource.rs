//! The resource capability: a named unit under health observation.

use async_trait::async_trait;

use avalio_core::CheckDetail;

/// Verdict of one `check()` call, after the resource's own retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOutcome {
    pub ok: bool,
    pub details: Vec<CheckDetail>,
}

impl CheckOutcome {
    pub fn ok() -> Self {
        Self {
            ok: true,
            details: Vec::new(),
        }
    }

    pub fn failed(details: Vec<CheckDetail>) -> Self {
        Self { ok: false, details }
    }
}

/// A checkable resource.
///
/// `name()` is unique across all configured resources. New kinds are added
/// by implementing this trait; the runner never changes.
#[async_trait]
pub trait Resource: Send + Sync {
    fn name(&self) -> &str;

    /// Diagnostic tag such as `"http"` or `"ping"`.
    fn kind(&self) -> &str;

    /// Run one fully resolved check, including any internal retries.
    async fn check(&self) -> CheckOutcome;
}
