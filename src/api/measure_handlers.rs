use crate::api::handlers::{error_response, status_for, AppState, ErrorResponse};
use crate::logic::{browse, MeasureUpdatePipeline};
use crate::model::{FormattedMeasureChange, ModelMeasures, UpdateOutcome};
use crate::store::traits::ModelServer;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateMeasuresRequest {
    pub measures: Vec<FormattedMeasureChange>,
}

/// GET /databases/{name}/measures
pub async fn list_measures<M: ModelServer + 'static>(
    Path(database): Path<String>,
    State(state): State<AppState<M>>,
) -> Result<Json<ModelMeasures>, (StatusCode, Json<ErrorResponse>)> {
    browse::list_measures(&state.server, &state.connection_string, &database)
        .await
        .map(Json)
        .map_err(error_response)
}

/// POST /databases/{name}/measures
/// Apply a batch of formatted measures. The body is always the outcome;
/// the status reflects its failure, if any.
pub async fn update_measures<M: ModelServer + 'static>(
    Path(database): Path<String>,
    State(state): State<AppState<M>>,
    RequestJson(req): RequestJson<UpdateMeasuresRequest>,
) -> (StatusCode, Json<UpdateOutcome>) {
    let outcome = MeasureUpdatePipeline::new(&state.server, &state.connection_string)
        .update(&database, &req.measures)
        .await;

    let status = outcome
        .failure
        .as_ref()
        .map(status_for)
        .unwrap_or(StatusCode::OK);

    (status, Json(outcome))
}
