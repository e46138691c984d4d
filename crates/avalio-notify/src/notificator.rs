use async_trait::async_trait;

use avalio_core::CheckResult;

use crate::error::NotifyResult;

/// A delivery sink for check results.
///
/// `name()` is unique across configured notificators and is the key
/// monitors use to address it.
#[async_trait]
pub trait Notificator: Send + Sync {
    fn name(&self) -> &str;

    /// Diagnostic tag such as `"console"` or `"telegram"`.
    fn kind(&self) -> &str;

    async fn deliver(&self, result: &CheckResult) -> NotifyResult<()>;
}
