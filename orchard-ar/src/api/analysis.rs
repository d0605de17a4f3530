//! Aggregate findings across every stored observation

use axum::{extract::State, Json};
use orchard_common::analysis::report::tree_ids;
use orchard_common::analysis::{aggregate, resolve, Distribution, DominantEntry};
use orchard_common::db;
use serde::Serialize;

use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub observation_count: usize,
    pub distribution: Distribution,
    /// `None` when no observation contributed any data
    pub dominant: Option<DominantEntry>,
    pub recommendations: Vec<String>,
    pub trees_analyzed: Vec<String>,
}

/// GET /api/analysis
pub async fn get_analysis(State(state): State<AppState>) -> Result<Json<AnalysisResponse>, ApiError> {
    let observations = db::list_observations(&state.db).await?;
    let config = &state.analysis;

    let distribution = aggregate(
        &observations,
        config.catalog.categories(),
        config.unknown_categories,
    );
    let dominant = resolve(&distribution).into_option();
    let recommendations = dominant
        .as_ref()
        .map(|entry| config.catalog.recommend(&entry.category).to_vec())
        .unwrap_or_default();

    Ok(Json(AnalysisResponse {
        observation_count: observations.len(),
        trees_analyzed: tree_ids(&observations),
        distribution,
        dominant,
        recommendations,
    }))
}
