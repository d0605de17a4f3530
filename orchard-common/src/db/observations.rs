//! Observation queries
//!
//! Append-only from the analysis engine's point of view: reports are always
//! computed from a fresh snapshot returned by these functions.

use sqlx::{FromRow, SqlitePool};
use tracing::warn;

use crate::analysis::Observation;
use crate::{time, Result};

/// Row as stored in `observations`
#[derive(Debug, Clone, FromRow)]
struct ObservationRow {
    id: i64,
    tree_id: Option<String>,
    payload: String,
    created_at: String,
}

impl From<ObservationRow> for Observation {
    fn from(row: ObservationRow) -> Self {
        let timestamp = time::from_storage(&row.created_at).unwrap_or_else(|| {
            warn!(
                "Observation {} has unreadable created_at '{}', using epoch",
                row.id, row.created_at
            );
            chrono::DateTime::<chrono::Utc>::default()
        });
        Observation::new(row.id, row.tree_id, timestamp, row.payload)
    }
}

/// All observations, newest first
pub async fn list_observations(pool: &SqlitePool) -> Result<Vec<Observation>> {
    let rows: Vec<ObservationRow> = sqlx::query_as(
        "SELECT id, tree_id, payload, created_at FROM observations ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Observation::from).collect())
}

/// One page of observations, newest first
pub async fn list_observations_page(
    pool: &SqlitePool,
    offset: i64,
    limit: i64,
) -> Result<Vec<Observation>> {
    let rows: Vec<ObservationRow> = sqlx::query_as(
        r#"
        SELECT id, tree_id, payload, created_at FROM observations
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(Observation::from).collect())
}

pub async fn count_observations(pool: &SqlitePool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM observations")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Store a new observation stamped with the current time
///
/// The payload is kept verbatim, even if it does not parse; malformed
/// payloads are handled at analysis time. Returns the new row id.
pub async fn append_observation(
    pool: &SqlitePool,
    tree_id: Option<&str>,
    raw_payload: &str,
) -> Result<i64> {
    let created_at = time::to_storage(&time::now());
    let tree_id = tree_id.map(str::trim).filter(|t| !t.is_empty());

    let result = sqlx::query(
        "INSERT INTO observations (tree_id, payload, created_at) VALUES (?, ?, ?)",
    )
    .bind(tree_id)
    .bind(raw_payload)
    .bind(&created_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Fetch a single observation by id
pub async fn get_observation(pool: &SqlitePool, id: i64) -> Result<Option<Observation>> {
    let row: Option<ObservationRow> = sqlx::query_as(
        "SELECT id, tree_id, payload, created_at FROM observations WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Observation::from))
}
