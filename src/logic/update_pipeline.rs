use crate::logic::apply::{self, ApplyReport};
use crate::logic::commit::{self, CommitStatus};
use crate::logic::conflict;
use crate::model::{FormattedMeasureChange, UpdateError, UpdateOutcome, UpdateState};
use crate::store::traits::{ModelServer, ModelSession};

/// Applies a batch of edited measure expressions to a live remote model
/// under optimistic concurrency.
///
/// Each call opens its own session, fetches the current snapshot, validates
/// the whole batch against its ETag, applies the accepted entries and
/// commits. The session is released on every exit path.
pub struct MeasureUpdatePipeline<'a, M: ModelServer> {
    server: &'a M,
    connection_string: &'a str,
}

impl<'a, M: ModelServer> MeasureUpdatePipeline<'a, M> {
    pub fn new(server: &'a M, connection_string: &'a str) -> Self {
        Self {
            server,
            connection_string,
        }
    }

    pub async fn update(
        &self,
        database: &str,
        batch: &[FormattedMeasureChange],
    ) -> UpdateOutcome {
        let mut run = UpdateRun::new(database);
        let result = self.execute(database, batch, &mut run).await;
        run.finish(result)
    }

    async fn execute(
        &self,
        database: &str,
        batch: &[FormattedMeasureChange],
        run: &mut UpdateRun<'_>,
    ) -> Result<CommitStatus, UpdateError> {
        let mut session = self
            .server
            .connect(self.connection_string)
            .await
            .map_err(|e| UpdateError::connection(e.to_string()))?;
        run.transition(UpdateState::Connected);

        let snapshot = session
            .fetch_database(database)
            .await
            .map_err(|e| UpdateError::connection(e.to_string()))?
            .ok_or_else(|| UpdateError::DatabaseNotFound {
                database: database.to_string(),
            })?;
        run.transition(UpdateState::SnapshotFetched);

        conflict::validate(batch, &snapshot.etag())?;
        run.transition(UpdateState::Validated);

        run.report = apply::apply(batch, &mut session, database)?;
        run.transition(UpdateState::Applied);

        commit::commit(&mut session, database).await
    }
}

/// Progress of one update call
struct UpdateRun<'a> {
    database: &'a str,
    state: UpdateState,
    report: ApplyReport,
}

impl<'a> UpdateRun<'a> {
    fn new(database: &'a str) -> Self {
        Self {
            database,
            state: UpdateState::Idle,
            report: ApplyReport::default(),
        }
    }

    fn transition(&mut self, next: UpdateState) {
        log::debug!("Update of '{}': {} -> {}", self.database, self.state, next);
        self.state = next;
    }

    fn finish(mut self, result: Result<CommitStatus, UpdateError>) -> UpdateOutcome {
        let failure = match result {
            Ok(CommitStatus::Committed) => {
                self.transition(UpdateState::Committed);
                log::info!(
                    "Committed {} measure(s) to '{}' ({} unchanged, {} skipped)",
                    self.report.applied,
                    self.database,
                    self.report.unchanged,
                    self.report.skipped
                );
                None
            }
            Ok(CommitStatus::Skipped) => {
                self.transition(UpdateState::Skipped);
                log::info!(
                    "No changes to commit to '{}' ({} unchanged, {} skipped)",
                    self.database,
                    self.report.unchanged,
                    self.report.skipped
                );
                None
            }
            Err(err) if err.is_conflict() => {
                self.transition(UpdateState::ConflictAborted);
                log::warn!("Update of '{}' aborted: {}", self.database, err);
                Some(err)
            }
            Err(err) => {
                self.transition(UpdateState::Failed);
                log::warn!("Update of '{}' failed: {}", self.database, err);
                Some(err)
            }
        };

        debug_assert!(self.state.is_terminal(), "update ended in {}", self.state);

        UpdateOutcome {
            state: self.state,
            applied_count: self.report.applied,
            unchanged_count: self.report.unchanged,
            skipped_count: self.report.skipped,
            committed: self.state == UpdateState::Committed,
            failure,
        }
    }
}
