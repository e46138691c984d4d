//! avalio-app — assembles resources, notificators and monitors into tasks.
//!
//! ```text
//! Application::start()
//!   ├── resolve every monitor reference (fatal if any is unknown)
//!   ├── one mpsc queue + listener task per notificator
//!   └── one MonitorRunner task per monitor × resource
//! ```
//!
//! [`factory`] turns an [`AvalioConfig`](avalio_core::AvalioConfig) into the
//! trait objects the application runs.

pub mod application;
pub mod error;
pub mod factory;
mod listener;

pub use application::{Application, Monitor, Running};
pub use error::{AppError, AppResult};
