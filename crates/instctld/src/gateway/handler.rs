use axum::{
    Json,
    extract::{Query, State},
};
use instctl_core::{ActionOutcome, InstanceSummary, RequestParams};
use std::collections::HashMap;

use super::AppState;
use super::error::ApiError;

/// `GET /api/regions`
pub async fn regions_handler(State(state): State<AppState>) -> Json<&'static [&'static str]> {
    Json(state.controller.regions())
}

/// `GET /api/instances?region=..&profile=..`
#[tracing::instrument(skip_all)]
pub async fn instances_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<Vec<InstanceSummary>>, ApiError> {
    let params = RequestParams::new(query);
    let instances = state.controller.list_instances(&params).await?;
    Ok(Json(instances))
}

/// `GET /api/instance?region=..&profile=..&name=..&secret=..&action=..`
#[tracing::instrument(skip_all)]
pub async fn instance_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<Json<ActionOutcome>, ApiError> {
    let params = RequestParams::new(query);
    let outcome = state.controller.dispatch(&params).await?;
    Ok(Json(outcome))
}
