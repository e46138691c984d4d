//! Schedule error types.

use thiserror::Error;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("invalid cron expression {expression:?}: {reason}")]
    InvalidExpression { expression: String, reason: String },
}

impl ScheduleError {
    pub(crate) fn invalid(expression: &str, reason: impl Into<String>) -> Self {
        ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}
