use serde::{Deserialize, Serialize};

use crate::model::UpdateError;

/// Per-call update state machine.
///
/// `Idle → Connected → SnapshotFetched → Validated → Applied → Committed | Skipped`,
/// with `ConflictAborted` reached only by a failed ETag validation and
/// `Failed` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateState {
    Idle,
    Connected,
    SnapshotFetched,
    Validated,
    Applied,
    Committed,
    Skipped,
    ConflictAborted,
    Failed,
}

impl UpdateState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            UpdateState::Committed
                | UpdateState::Skipped
                | UpdateState::ConflictAborted
                | UpdateState::Failed
        )
    }
}

impl std::fmt::Display for UpdateState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            UpdateState::Idle => write!(f, "idle"),
            UpdateState::Connected => write!(f, "connected"),
            UpdateState::SnapshotFetched => write!(f, "snapshot_fetched"),
            UpdateState::Validated => write!(f, "validated"),
            UpdateState::Applied => write!(f, "applied"),
            UpdateState::Committed => write!(f, "committed"),
            UpdateState::Skipped => write!(f, "skipped"),
            UpdateState::ConflictAborted => write!(f, "conflict_aborted"),
            UpdateState::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one update call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    pub state: UpdateState,
    /// Expressions written into the pending change set
    pub applied_count: usize,
    /// Entries whose expression already matched the remote text
    pub unchanged_count: usize,
    /// Entries skipped because they carried formatting errors
    pub skipped_count: usize,
    pub committed: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub failure: Option<UpdateError>,
}

impl UpdateOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn into_result(self) -> Result<UpdateOutcome, UpdateError> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
