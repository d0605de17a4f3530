//! Embedded summary codes
//!
//! Every report section carries a compact text code that a separate decoder
//! can turn back into the section's findings without access to the store.
//!
//! # Format (version 1)
//!
//! ```text
//! ORCH1.<base64url, no padding, of a JSON document>
//! ```
//!
//! The JSON document is
//! `{"v":1,"title":"...","entries":[["Healthy",80.0],...],"dominant":"Healthy"|null,"recommendations":["..."]}`
//! with percentages rounded to two decimals. Whitespace anywhere in the code
//! is ignored on decode so codes can be wrapped across lines.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::{AnalysisError, Distribution, DominantEntry};

/// Code prefix; the digit is the format version
pub const PREFIX: &str = "ORCH1.";

/// Current format version
pub const VERSION: u32 = 1;

/// Decoded summary code content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPayload {
    pub v: u32,
    pub title: String,
    /// (category, percentage) in distribution order
    pub entries: Vec<(String, f64)>,
    /// `None` when the section had no data
    pub dominant: Option<String>,
    pub recommendations: Vec<String>,
}

impl SummaryPayload {
    pub fn new(
        title: &str,
        distribution: &Distribution,
        dominant: &DominantEntry,
        recommendations: &[String],
    ) -> Self {
        Self {
            v: VERSION,
            title: title.to_string(),
            entries: distribution
                .iter()
                .map(|share| (share.category.clone(), round2(share.percentage)))
                .collect(),
            dominant: (!dominant.is_no_data()).then(|| dominant.category.clone()),
            recommendations: recommendations.to_vec(),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Encode a payload as a summary code
pub fn encode(payload: &SummaryPayload) -> Result<String, AnalysisError> {
    let document = serde_json::to_string(payload)
        .map_err(|e| AnalysisError::InvalidSummaryCode(format!("cannot serialize: {}", e)))?;
    Ok(format!("{}{}", PREFIX, URL_SAFE_NO_PAD.encode(document)))
}

/// Decode a summary code produced by [`encode`]
pub fn decode(code: &str) -> Result<SummaryPayload, AnalysisError> {
    let compact: String = code.chars().filter(|c| !c.is_whitespace()).collect();

    let body = compact.strip_prefix(PREFIX).ok_or_else(|| {
        AnalysisError::InvalidSummaryCode(format!("expected prefix '{}'", PREFIX))
    })?;

    let bytes = URL_SAFE_NO_PAD
        .decode(body)
        .map_err(|e| AnalysisError::InvalidSummaryCode(format!("bad base64: {}", e)))?;

    let payload: SummaryPayload = serde_json::from_slice(&bytes)
        .map_err(|e| AnalysisError::InvalidSummaryCode(format!("bad JSON: {}", e)))?;

    if payload.v != VERSION {
        return Err(AnalysisError::InvalidSummaryCode(format!(
            "unsupported version {}",
            payload.v
        )));
    }

    Ok(payload)
}
