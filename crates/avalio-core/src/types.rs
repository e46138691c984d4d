//! Shared types used across avalio crates.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A title/description diagnostic pair attached to a check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckDetail {
    pub title: String,
    pub description: String,
}

impl CheckDetail {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for CheckDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Classified health state of a resource for one check cycle.
///
/// `NotAvailable` and `Recovered` are edges; `Available` and
/// `StillNotAvailable` are steady repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceState {
    Available,
    NotAvailable,
    StillNotAvailable,
    Recovered,
}

impl ResourceState {
    pub fn label(&self) -> &'static str {
        match self {
            ResourceState::Available => "available",
            ResourceState::NotAvailable => "not available",
            ResourceState::StillNotAvailable => "still not available",
            ResourceState::Recovered => "recovered",
        }
    }

    /// Whether this state marks a change in health.
    pub fn is_edge(&self) -> bool {
        matches!(self, ResourceState::NotAvailable | ResourceState::Recovered)
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one check cycle, fanned out to notificators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult {
    pub resource_name: String,
    pub resource_kind: String,
    /// Monitor whose runner produced this result.
    pub monitor_name: String,
    pub state: ResourceState,
    pub details: Vec<CheckDetail>,
    pub checked_at: DateTime<Utc>,
}

impl CheckResult {
    /// Render details as `title: description` lines.
    pub fn details_as_string(&self) -> String {
        self.details
            .iter()
            .map(|d| format!("{d}\n"))
            .collect()
    }
}
