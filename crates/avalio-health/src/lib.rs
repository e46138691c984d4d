//! avalio-health — resource checks and the per-resource monitor loop.
//!
//! # Architecture
//!
//! ```text
//! MonitorRunner (one task per monitor × resource)
//!   ├── Resource::check() → CheckOutcome   (retries live in the resource)
//!   ├── StateTracker (last cycle failed?) → ResourceState
//!   ├── Blocking handoff onto each notificator queue, in order
//!   └── Sleep until Schedule::next_after(now), or shutdown
//! ```
//!
//! Built-in resources:
//!
//! - [`HttpResource`] sends `HEAD` and compares the status code.
//! - [`PingResource`] sends one echo probe per attempt through a
//!   [`Prober`]. All ping resources share one [`ProbeLock`].

pub mod error;
pub mod http;
pub mod ping;
pub mod resource;
pub mod runner;
pub mod tracker;

pub use error::{ProbeError, ResourceError, ResourceResult};
pub use http::HttpResource;
pub use ping::{PingResource, ProbeLock, Prober, SystemPing};
pub use resource::{CheckOutcome, Resource};
pub use runner::{Clock, Destination, MonitorRunner, SystemClock};
pub use tracker::StateTracker;
