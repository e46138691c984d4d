//! Console notificator — one structured log event per result.

use async_trait::async_trait;
use tracing::info;

use avalio_core::CheckResult;

use crate::error::NotifyResult;
use crate::notificator::Notificator;

pub struct ConsoleNotificator {
    name: String,
}

impl ConsoleNotificator {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Notificator for ConsoleNotificator {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> &str {
        "console"
    }

    async fn deliver(&self, result: &CheckResult) -> NotifyResult<()> {
        let details = serde_json::to_string(&result.details).unwrap_or_default();
        info!(
            notificator = %self.name,
            monitor = %result.monitor_name,
            resource = %result.resource_name,
            kind = %result.resource_kind,
            state = %result.state,
            checked_at = %result.checked_at,
            %details,
            "got check result for resource"
        );
        Ok(())
    }
}
