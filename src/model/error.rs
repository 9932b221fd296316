use serde::{Deserialize, Serialize};

use crate::model::MeasureRef;

/// Failures of a measure update call.
///
/// Only `Conflict` is expected in normal operation: the caller should refetch
/// the snapshot, re-render its edits and submit again. Every other variant is
/// fatal for the call. Nothing is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UpdateError {
    #[error("{message}")]
    Connection { message: String },

    #[error("database '{database}' not found")]
    DatabaseNotFound { database: String },

    #[error("measure {measure} was edited against a stale version of the model")]
    Conflict { measure: MeasureRef },

    #[error("measure {measure} not found")]
    MeasureNotFound { measure: MeasureRef },

    #[error("update failed: {message}")]
    UpdateFailed { message: String },
}

impl UpdateError {
    pub fn connection(message: impl Into<String>) -> Self {
        UpdateError::Connection {
            message: message.into(),
        }
    }

    pub fn update_failed(message: impl Into<String>) -> Self {
        UpdateError::UpdateFailed {
            message: message.into(),
        }
    }

    /// Stable problem code reported to HTTP callers
    pub fn problem(&self) -> &'static str {
        match self {
            UpdateError::Connection { .. } => "connection_error",
            UpdateError::DatabaseNotFound { .. } => "database_not_found",
            UpdateError::Conflict { .. } => "update_conflict_measure",
            UpdateError::MeasureNotFound { .. } => "measure_not_found",
            UpdateError::UpdateFailed { .. } => "update_failed",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, UpdateError::Conflict { .. })
    }
}
