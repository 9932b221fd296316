use crate::model::{DatabaseSnapshot, MeasureDefinition, MeasureRef};
use anyhow::Result;
use itertools::Itertools;

/// Entry point to a remote tabular engine
#[async_trait::async_trait]
pub trait ModelServer: Send + Sync {
    type Session: ModelSession + 'static;

    /// Open a session with an already-authenticated connection string.
    /// The session is released when the returned value is dropped.
    async fn connect(&self, connection_string: &str) -> Result<Self::Session>;
}

/// One connected session against the remote engine.
///
/// Lookups and expression edits operate on the session's local copy of the
/// model; `push_schema_update` and `save_changes` are the round-trips that
/// publish the pending change set. Dropping a session without saving
/// discards its pending edits.
#[async_trait::async_trait]
pub trait ModelSession: Send + Sync {
    type Measure: MeasureHandle;

    /// Fetch the current identity of a database and load its model into the session
    async fn fetch_database(&mut self, name: &str) -> Result<Option<DatabaseSnapshot>>;

    /// Whether a previously fetched database still resolves on the server.
    /// Does not reload the model, so pending edits are kept.
    async fn database_exists(&self, name: &str) -> Result<bool>;

    /// Resolve a measure of a previously fetched database
    fn measure_mut(&mut self, database: &str, measure: &MeasureRef) -> Option<&mut Self::Measure>;

    /// All measures of a previously fetched database, in table/measure order
    fn list_measures(&self, database: &str) -> Vec<MeasureDefinition>;

    fn has_local_changes(&self, database: &str) -> bool;

    /// Push the schema-level update for the pending change set
    async fn push_schema_update(&mut self, database: &str) -> Result<()>;

    /// Save and validate the pending change set
    async fn save_changes(&mut self, database: &str) -> Result<SaveResult>;
}

pub trait MeasureHandle: Send + Sync {
    fn expression(&self) -> &str;
    fn set_expression(&mut self, expression: &str);
}

/// Per-object error entry reported by the engine's save/validate operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveDiagnostic {
    pub object: Option<String>,
    pub description: String,
}

impl SaveDiagnostic {
    pub fn new(object: Option<String>, description: impl Into<String>) -> Self {
        Self {
            object,
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveResult {
    pub errors: Vec<SaveDiagnostic>,
}

impl SaveResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// All error descriptions, one per line
    pub fn description(&self) -> String {
        self.errors.iter().map(|e| e.description.as_str()).join("\n")
    }
}
