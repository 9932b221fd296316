use serde::{Deserialize, Serialize};

use crate::model::UpdateError;
use crate::store::traits::ModelSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitStatus {
    /// Pending changes were pushed and saved
    Committed,
    /// Nothing was pending, no round-trip was made
    Skipped,
}

/// Publish the session's pending change set for `database`.
pub async fn commit<S: ModelSession>(
    session: &mut S,
    database: &str,
) -> Result<CommitStatus, UpdateError> {
    let exists = session
        .database_exists(database)
        .await
        .map_err(|e| UpdateError::connection(e.to_string()))?;
    if !exists {
        return Err(UpdateError::DatabaseNotFound {
            database: database.to_string(),
        });
    }

    if !session.has_local_changes(database) {
        log::debug!("No pending changes for '{}', skipping save", database);
        return Ok(CommitStatus::Skipped);
    }

    session
        .push_schema_update(database)
        .await
        .map_err(|e| UpdateError::update_failed(e.to_string()))?;

    let result = session
        .save_changes(database)
        .await
        .map_err(|e| UpdateError::update_failed(e.to_string()))?;

    if result.has_errors() {
        return Err(UpdateError::update_failed(result.description()));
    }

    Ok(CommitStatus::Committed)
}
