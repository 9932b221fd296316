use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::logic::browse;
use crate::model::{DatabaseInfo, UpdateError};
use crate::store::traits::ModelServer;

/// Shared state of the HTTP surface: the engine and the connection string
/// every session is opened with
pub struct ServiceState<M> {
    pub server: M,
    pub connection_string: String,
}

impl<M> ServiceState<M> {
    pub fn new(server: M, connection_string: impl Into<String>) -> Self {
        Self {
            server,
            connection_string: connection_string.into(),
        }
    }
}

pub type AppState<M> = Arc<ServiceState<M>>;

/// Simple health check endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub problem: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            error: message.to_string(),
            problem: None,
        }
    }
}

impl From<&UpdateError> for ErrorResponse {
    fn from(err: &UpdateError) -> Self {
        Self {
            error: err.to_string(),
            problem: Some(err.problem().to_string()),
        }
    }
}

/// HTTP status reported for a failed call
pub fn status_for(err: &UpdateError) -> StatusCode {
    match err {
        UpdateError::Connection { .. } => StatusCode::BAD_GATEWAY,
        UpdateError::DatabaseNotFound { .. } | UpdateError::MeasureNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        UpdateError::Conflict { .. } => StatusCode::CONFLICT,
        UpdateError::UpdateFailed { .. } => StatusCode::BAD_REQUEST,
    }
}

pub fn error_response(err: UpdateError) -> (StatusCode, Json<ErrorResponse>) {
    (status_for(&err), Json(ErrorResponse::from(&err)))
}

/// GET /databases/{name}
pub async fn get_database<M: ModelServer + 'static>(
    Path(database): Path<String>,
    State(state): State<AppState<M>>,
) -> Result<Json<DatabaseInfo>, (StatusCode, Json<ErrorResponse>)> {
    browse::describe_database(&state.server, &state.connection_string, &database)
        .await
        .map(Json)
        .map_err(error_response)
}
