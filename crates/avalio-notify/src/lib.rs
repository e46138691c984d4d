//! avalio-notify — delivery sinks for check results.
//!
//! Every notificator gets its own queue and listener task (see
//! `avalio-app`); this crate only defines what a single delivery does.
//! Delivery is best-effort: errors are returned to the listener, logged
//! there, and never retried.

pub mod console;
pub mod error;
pub mod notificator;
pub mod telegram;

pub use console::ConsoleNotificator;
pub use error::{NotifyError, NotifyResult};
pub use notificator::Notificator;
pub use telegram::TelegramNotificator;
