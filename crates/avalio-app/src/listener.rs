use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error};

use avalio_core::CheckResult;
use avalio_notify::Notificator;

/// Drain one notificator queue until shutdown or until every runner
/// holding a sender has stopped.
///
/// Results are delivered one at a time; a failed delivery is logged and
/// dropped. Shutdown abandons a delivery in flight.
pub(crate) async fn listen(
    notificator: Arc<dyn Notificator>,
    mut queue: mpsc::Receiver<CheckResult>,
    mut shutdown: watch::Receiver<bool>,
) {
    debug!(notificator = %notificator.name(), kind = %notificator.kind(), "listener started");

    loop {
        if *shutdown.borrow_and_update() {
            break;
        }

        let result = tokio::select! {
            received = queue.recv() => match received {
                Some(result) => result,
                None => break,
            },
            _ = shutdown.changed() => break,
        };

        tokio::select! {
            delivered = notificator.deliver(&result) => {
                if let Err(e) = delivered {
                    error!(
                        notificator = %notificator.name(),
                        resource = %result.resource_name,
                        state = %result.state,
                        error = %e,
                        "failed to deliver check result"
                    );
                }
            }
            _ = shutdown.changed() => break,
        }
    }

    debug!(notificator = %notificator.name(), "listener stopped");
}
