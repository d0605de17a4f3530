//! Summary code decoding

use axum::Json;
use orchard_common::analysis::summary_code::{self, SummaryPayload};
use serde::Deserialize;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct DecodeRequest {
    pub code: String,
}

/// POST /api/summary/decode
///
/// Works from the code alone; the store is not consulted.
pub async fn decode_summary(
    Json(request): Json<DecodeRequest>,
) -> Result<Json<SummaryPayload>, ApiError> {
    Ok(Json(summary_code::decode(&request.code)?))
}
