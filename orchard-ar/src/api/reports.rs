//! Report and CSV downloads
//!
//! Each download is computed from a fresh snapshot of the store.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use orchard_common::analysis::report::compose_document;
use orchard_common::analysis::{export, render_text, to_csv, ReportMode};
use orchard_common::{db, time};
use tracing::info;

use crate::error::ApiError;
use crate::AppState;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

/// GET /api/reports/records
///
/// One section per observation, each starting on its own page.
pub async fn download_records_report(State(state): State<AppState>) -> Result<Response, ApiError> {
    report(&state, ReportMode::PerRecord).await
}

/// GET /api/reports/aggregate
pub async fn download_aggregate_report(State(state): State<AppState>) -> Result<Response, ApiError> {
    report(&state, ReportMode::Aggregate).await
}

/// GET /api/reports/records/:id
///
/// The disease analysis report for a single observation.
pub async fn download_record_report(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let observation = db::get_observation(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Observation {} not found", id)))?;

    let mode = ReportMode::SingleRecord;
    let document = compose_document(
        std::slice::from_ref(&observation),
        mode,
        &state.analysis,
        &state.geometry,
    );
    info!("Generated {} for observation {}", document.title, id);

    let filename = format!(
        "{}-{}-{}.txt",
        mode.filename_stem(),
        id,
        time::filename_stamp(&time::now())
    );
    Ok(attachment(TEXT_CONTENT_TYPE, &filename, render_text(&document)))
}

async fn report(state: &AppState, mode: ReportMode) -> Result<Response, ApiError> {
    let observations = db::list_observations(&state.db).await?;
    if observations.is_empty() && mode == ReportMode::PerRecord {
        return Err(ApiError::NotFound("No observations to report".to_string()));
    }

    let document = compose_document(&observations, mode, &state.analysis, &state.geometry);
    info!(
        "Generated {} ({} observations, {} pages)",
        document.title,
        observations.len(),
        document.page_count()
    );

    let filename = format!(
        "{}-{}.txt",
        mode.filename_stem(),
        time::filename_stamp(&time::now())
    );
    Ok(attachment(TEXT_CONTENT_TYPE, &filename, render_text(&document)))
}

/// GET /api/export/csv
///
/// Always succeeds; an empty store exports just the header line.
pub async fn download_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let observations = db::list_observations(&state.db).await?;
    let rows = export(&observations, &state.analysis);
    info!("Exported {} observations as CSV", rows.len());

    let filename = format!("observations-{}.csv", time::filename_stamp(&time::now()));
    Ok(attachment(CSV_CONTENT_TYPE, &filename, to_csv(&rows)))
}

fn attachment(content_type: &'static str, filename: &str, body: String) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
