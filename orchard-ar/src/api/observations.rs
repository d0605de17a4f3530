//! Observation listing and ingestion

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use orchard_common::analysis::{payload, NormalizedEntry, Observation};
use orchard_common::{db, time};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::pagination::{calculate_pagination, Pagination};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Page number (1-indexed); omitted means every observation
    pub page: Option<i64>,
}

/// An observation as returned to clients
#[derive(Debug, Serialize)]
pub struct ObservationView {
    pub id: i64,
    pub tree_id: Option<String>,
    pub timestamp: String,
    pub raw_payload: String,
    /// Parsed entries, `None` when the payload is malformed
    pub entries: Option<Vec<NormalizedEntry>>,
}

impl From<Observation> for ObservationView {
    fn from(observation: Observation) -> Self {
        let entries = payload::parse(&observation.raw_payload).ok();
        Self {
            id: observation.id,
            timestamp: time::to_storage(&observation.timestamp),
            tree_id: observation.tree_id,
            raw_payload: observation.raw_payload,
            entries,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub observations: Vec<ObservationView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// GET /api/observations[?page=N]
///
/// Newest first.
pub async fn list_observations(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let (observations, pagination) = match query.page {
        Some(requested) => {
            let total = db::count_observations(&state.db).await?;
            let pagination = calculate_pagination(total, requested);
            let page = db::list_observations_page(&state.db, pagination.offset, pagination.page_size)
                .await?;
            (page, Some(pagination))
        }
        None => (db::list_observations(&state.db).await?, None),
    };

    Ok(Json(ListResponse {
        observations: observations.into_iter().map(ObservationView::from).collect(),
        pagination,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateObservationRequest {
    #[serde(default)]
    pub tree_id: Option<String>,
    /// A string is stored verbatim; any other JSON value as its serialized text
    #[serde(default)]
    pub payload: Value,
}

/// POST /api/observations
///
/// Payloads are not validated beyond being present: a payload that does not
/// parse is still stored and shows up as a placeholder in reports.
pub async fn create_observation(
    State(state): State<AppState>,
    Json(request): Json<CreateObservationRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let raw_payload = match request.payload {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    };
    if raw_payload.trim().is_empty() {
        return Err(ApiError::BadRequest("payload must not be empty".to_string()));
    }

    if let Err(e) = payload::parse(&raw_payload) {
        debug!("Storing unparseable payload: {}", e);
    }

    let id = db::append_observation(&state.db, request.tree_id.as_deref(), &raw_payload).await?;
    info!(
        "Stored observation {} (tree {})",
        id,
        request.tree_id.as_deref().unwrap_or("-")
    );

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}
