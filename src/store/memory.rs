use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::model::{generate_id, DatabaseSnapshot, Id, MeasureDefinition, MeasureRef};
use crate::store::traits::{MeasureHandle, ModelServer, ModelSession, SaveDiagnostic, SaveResult};

/// Seedable description of a tabular database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryModel {
    pub name: String,
    #[serde(default)]
    pub version: i64,
    #[serde(default = "Utc::now")]
    pub last_update: DateTime<Utc>,
    #[serde(default)]
    pub tables: Vec<MemoryTable>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryTable {
    pub name: String,
    #[serde(default)]
    pub measures: Vec<MeasureDefinitionSeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureDefinitionSeed {
    pub name: String,
    pub expression: String,
}

#[derive(Debug, Clone)]
struct StoredDatabase {
    snapshot: DatabaseSnapshot,
    measures: BTreeMap<MeasureRef, String>,
}

impl From<MemoryModel> for StoredDatabase {
    fn from(model: MemoryModel) -> Self {
        let mut measures = BTreeMap::new();
        for table in model.tables {
            for measure in table.measures {
                measures.insert(
                    MeasureRef::new(table.name.clone(), measure.name),
                    measure.expression,
                );
            }
        }

        Self {
            snapshot: DatabaseSnapshot::new(model.name, model.version, model.last_update),
            measures,
        }
    }
}

#[derive(Debug, Default)]
struct EngineState {
    databases: HashMap<String, StoredDatabase>,
    offline: bool,
    injected_save_errors: Option<Vec<String>>,
    injected_lookup_failure: Option<String>,
    injected_push_failure: Option<String>,
    injected_save_failure: Option<String>,
    open_sessions: usize,
    pushes: usize,
    saves: usize,
}

/// In-process tabular engine used for local serving and tests.
///
/// Clones share the same engine state.
#[derive(Debug, Clone, Default)]
pub struct MemoryModelServer {
    state: Arc<Mutex<EngineState>>,
}

impl MemoryModelServer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models(models: impl IntoIterator<Item = MemoryModel>) -> Self {
        let server = Self::new();
        for model in models {
            server.add_model(model);
        }
        server
    }

    /// Insert or replace a database
    pub fn add_model(&self, model: MemoryModel) {
        let stored = StoredDatabase::from(model);
        let mut state = self.state.lock();
        state
            .databases
            .insert(stored.snapshot.name.clone(), stored);
    }

    pub fn remove_database(&self, name: &str) -> bool {
        self.state.lock().databases.remove(name).is_some()
    }

    /// When offline every connect attempt fails
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// The next save returns these diagnostics without publishing anything
    pub fn fail_next_save(&self, messages: Vec<String>) {
        self.state.lock().injected_save_errors = Some(messages);
    }

    /// Make the next existence check fail with a transport error
    pub fn fail_next_lookup(&self, message: impl Into<String>) {
        self.state.lock().injected_lookup_failure = Some(message.into());
    }

    /// Make the next schema push fail with a transport error
    pub fn fail_next_push(&self, message: impl Into<String>) {
        self.state.lock().injected_push_failure = Some(message.into());
    }

    /// Make the next save fail with a transport error instead of diagnostics
    pub fn fail_next_save_transport(&self, message: impl Into<String>) {
        self.state.lock().injected_save_failure = Some(message.into());
    }

    /// Simulate a concurrent writer: bump the version of a database
    pub fn touch(&self, name: &str) -> Option<DatabaseSnapshot> {
        let mut state = self.state.lock();
        let stored = state.databases.get_mut(name)?;
        stored.snapshot.version += 1;
        stored.snapshot.last_update = Utc::now();
        Some(stored.snapshot.clone())
    }

    pub fn snapshot(&self, name: &str) -> Option<DatabaseSnapshot> {
        let state = self.state.lock();
        state.databases.get(name).map(|db| db.snapshot.clone())
    }

    pub fn expression(&self, database: &str, measure: &MeasureRef) -> Option<String> {
        let state = self.state.lock();
        state
            .databases
            .get(database)
            .and_then(|db| db.measures.get(measure).cloned())
    }

    pub fn open_sessions(&self) -> usize {
        self.state.lock().open_sessions
    }

    pub fn push_count(&self) -> usize {
        self.state.lock().pushes
    }

    pub fn save_count(&self) -> usize {
        self.state.lock().saves
    }
}

#[async_trait::async_trait]
impl ModelServer for MemoryModelServer {
    type Session = MemorySession;

    async fn connect(&self, connection_string: &str) -> Result<MemorySession> {
        let data_source = parse_data_source(connection_string)?;

        let mut state = self.state.lock();
        if state.offline {
            return Err(anyhow!(
                "A connection cannot be made to '{}'. The engine is unreachable.",
                data_source
            ));
        }
        state.open_sessions += 1;

        let session = MemorySession {
            id: generate_id(),
            state: Arc::clone(&self.state),
            databases: HashMap::new(),
        };
        log::debug!("Session {} opened against '{}'", session.id, data_source);

        Ok(session)
    }
}

/// `Data Source` value of a `key=value;` connection string
fn parse_data_source(connection_string: &str) -> Result<String> {
    connection_string
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("data source"))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| anyhow!("The connection string does not specify a 'Data Source'"))
}

#[derive(Debug)]
pub struct MemoryMeasure {
    expression: String,
    modified: bool,
}

impl MeasureHandle for MemoryMeasure {
    fn expression(&self) -> &str {
        &self.expression
    }

    fn set_expression(&mut self, expression: &str) {
        self.expression = expression.to_string();
        self.modified = true;
    }
}

#[derive(Debug)]
struct LocalDatabase {
    snapshot: DatabaseSnapshot,
    measures: BTreeMap<MeasureRef, MemoryMeasure>,
}

/// Session against a [`MemoryModelServer`]; released on drop
#[derive(Debug)]
pub struct MemorySession {
    id: Id,
    state: Arc<Mutex<EngineState>>,
    databases: HashMap<String, LocalDatabase>,
}

impl MemorySession {
    fn local(&self, database: &str) -> Result<&LocalDatabase> {
        self.databases
            .get(database)
            .ok_or_else(|| anyhow!("Database '{}' has not been fetched in this session", database))
    }
}

#[async_trait::async_trait]
impl ModelSession for MemorySession {
    type Measure = MemoryMeasure;

    async fn fetch_database(&mut self, name: &str) -> Result<Option<DatabaseSnapshot>> {
        let stored = self.state.lock().databases.get(name).cloned();

        let Some(stored) = stored else {
            self.databases.remove(name);
            return Ok(None);
        };

        let measures = stored
            .measures
            .into_iter()
            .map(|(measure, expression)| {
                (
                    measure,
                    MemoryMeasure {
                        expression,
                        modified: false,
                    },
                )
            })
            .collect();

        self.databases.insert(
            name.to_string(),
            LocalDatabase {
                snapshot: stored.snapshot.clone(),
                measures,
            },
        );

        Ok(Some(stored.snapshot))
    }

    async fn database_exists(&self, name: &str) -> Result<bool> {
        let mut state = self.state.lock();
        if let Some(message) = state.injected_lookup_failure.take() {
            return Err(anyhow!(message));
        }
        if !self.databases.contains_key(name) {
            return Ok(false);
        }
        Ok(state.databases.contains_key(name))
    }

    fn measure_mut(&mut self, database: &str, measure: &MeasureRef) -> Option<&mut MemoryMeasure> {
        self.databases.get_mut(database)?.measures.get_mut(measure)
    }

    fn list_measures(&self, database: &str) -> Vec<MeasureDefinition> {
        self.databases
            .get(database)
            .map(|local| {
                local
                    .measures
                    .iter()
                    .map(|(measure, handle)| MeasureDefinition {
                        measure: measure.clone(),
                        expression: handle.expression.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn has_local_changes(&self, database: &str) -> bool {
        self.databases
            .get(database)
            .map(|local| local.measures.values().any(|m| m.modified))
            .unwrap_or(false)
    }

    async fn push_schema_update(&mut self, database: &str) -> Result<()> {
        self.local(database)?;

        let mut state = self.state.lock();
        if let Some(message) = state.injected_push_failure.take() {
            return Err(anyhow!(message));
        }
        if !state.databases.contains_key(database) {
            return Err(anyhow!("Database '{}' no longer exists on the server", database));
        }
        state.pushes += 1;

        Ok(())
    }

    async fn save_changes(&mut self, database: &str) -> Result<SaveResult> {
        let local = self
            .databases
            .get_mut(database)
            .ok_or_else(|| anyhow!("Database '{}' has not been fetched in this session", database))?;

        let mut state = self.state.lock();
        if let Some(message) = state.injected_save_failure.take() {
            return Err(anyhow!(message));
        }
        if let Some(messages) = state.injected_save_errors.take() {
            return Ok(SaveResult {
                errors: messages
                    .into_iter()
                    .map(|message| SaveDiagnostic::new(None, message))
                    .collect(),
            });
        }

        let stored = state
            .databases
            .get_mut(database)
            .ok_or_else(|| anyhow!("Database '{}' no longer exists on the server", database))?;

        let mut errors = Vec::new();
        for (measure, handle) in local.measures.iter().filter(|(_, m)| m.modified) {
            if !stored.measures.contains_key(measure) {
                errors.push(SaveDiagnostic::new(
                    Some(measure.to_string()),
                    format!(
                        "Measure '{}'[{}] no longer exists in the model",
                        measure.table_name, measure.measure_name
                    ),
                ));
            } else if let Some(problem) = check_expression(&handle.expression) {
                errors.push(SaveDiagnostic::new(
                    Some(measure.to_string()),
                    format!(
                        "Measure '{}'[{}]: {}",
                        measure.table_name, measure.measure_name, problem
                    ),
                ));
            }
        }
        if !errors.is_empty() {
            return Ok(SaveResult { errors });
        }

        for (measure, handle) in local.measures.iter_mut().filter(|(_, m)| m.modified) {
            stored
                .measures
                .insert(measure.clone(), handle.expression.clone());
            handle.modified = false;
        }
        stored.snapshot.version += 1;
        stored.snapshot.last_update = Utc::now();
        local.snapshot = stored.snapshot.clone();
        state.saves += 1;

        log::debug!(
            "Session {} saved '{}' at version {}",
            self.id,
            database,
            local.snapshot.version
        );

        Ok(SaveResult::ok())
    }
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.open_sessions = state.open_sessions.saturating_sub(1);
        log::debug!("Session {} released", self.id);
    }
}

/// Structural check standing in for the engine's expression validation
fn check_expression(expression: &str) -> Option<String> {
    if expression.trim().is_empty() {
        return Some("the expression is empty".to_string());
    }

    let mut stack = Vec::new();
    let mut in_string = false;
    for c in expression.chars() {
        if in_string {
            if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' => stack.push(c),
            ')' | ']' => {
                let expected = if c == ')' { '(' } else { '[' };
                if stack.pop() != Some(expected) {
                    return Some(format!("unexpected '{}'", c));
                }
            }
            _ => {}
        }
    }

    if in_string {
        return Some("unterminated string literal".to_string());
    }
    stack
        .last()
        .map(|open| format!("unclosed '{}'", open))
}
