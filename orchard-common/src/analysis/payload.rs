//! Observation payload parsing
//!
//! Payloads are untrusted JSON. Two shapes are accepted:
//! - an object mapping category name to value (`{"Healthy": 80}`)
//! - a list of `[category, value]` pairs (`[["Healthy", 80]]`)
//!
//! Anything else fails as [`AnalysisError::MalformedPayload`]. Individual
//! entries whose value does not coerce to a finite, non-negative number are
//! dropped without failing the payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AnalysisError;

/// A parsed (category, value) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEntry {
    /// Category name with surrounding whitespace trimmed
    pub category: String,
    /// Finite, non-negative value
    pub value: f64,
}

impl NormalizedEntry {
    pub fn new(category: impl Into<String>, value: f64) -> Self {
        Self {
            category: category.into(),
            value,
        }
    }
}

/// Parse a raw payload into normalized entries, preserving payload order
pub fn parse(raw_payload: &str) -> Result<Vec<NormalizedEntry>, AnalysisError> {
    let document: Value = serde_json::from_str(raw_payload)
        .map_err(|e| AnalysisError::MalformedPayload(e.to_string()))?;

    match document {
        Value::Object(map) => Ok(map
            .iter()
            .filter_map(|(category, value)| normalize(category, value))
            .collect()),
        Value::Array(pairs) => Ok(pairs.iter().filter_map(normalize_pair).collect()),
        other => Err(AnalysisError::MalformedPayload(format!(
            "expected an object or a list of pairs, found {}",
            json_kind(&other)
        ))),
    }
}

fn normalize(category: &str, value: &Value) -> Option<NormalizedEntry> {
    let category = category.trim();
    if category.is_empty() {
        return None;
    }
    coerce_number(value).map(|value| NormalizedEntry::new(category, value))
}

fn normalize_pair(pair: &Value) -> Option<NormalizedEntry> {
    match pair.as_array()?.as_slice() {
        [Value::String(category), value] => normalize(category, value),
        _ => None,
    }
}

/// Numeric coercion: numbers and numeric strings only
fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (number.is_finite() && number >= 0.0).then_some(number)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_object_keeps_payload_order() {
        let entries = parse(r#"{"Red scale": 20, "Healthy": 80}"#).unwrap();
        assert_eq!(
            entries,
            vec![NormalizedEntry::new("Red scale", 20.0), NormalizedEntry::new("Healthy", 80.0)]
        );
    }

    #[test]
    fn test_parse_pair_list() {
        let entries = parse(r#"[["Healthy", 0.75], ["Citrus leafminer", "0.25"]]"#).unwrap();
        assert_eq!(
            entries,
            vec![
                NormalizedEntry::new("Healthy", 0.75),
                NormalizedEntry::new("Citrus leafminer", 0.25)
            ]
        );
    }

    #[test]
    fn test_keys_are_trimmed_but_not_case_folded() {
        let entries = parse(r#"{"  Healthy ": 1, "healthy": 2}"#).unwrap();
        assert_eq!(entries[0].category, "Healthy");
        assert_eq!(entries[1].category, "healthy");
    }

    #[test]
    fn test_numeric_strings_are_coerced() {
        let entries = parse(r#"{"Healthy": " 12.5 "}"#).unwrap();
        assert_eq!(entries, vec![NormalizedEntry::new("Healthy", 12.5)]);
    }

    #[test]
    fn test_bad_entries_are_dropped_not_zero_filled() {
        let raw = r#"{"A": "abc", "B": null, "C": true, "D": [1], "E": "", "F": "NaN", "G": -3, "H": 4}"#;
        let entries = parse(raw).unwrap();
        assert_eq!(entries, vec![NormalizedEntry::new("H", 4.0)]);
    }

    #[test]
    fn test_blank_category_is_dropped() {
        let entries = parse(r#"{"   ": 5, "Healthy": 1}"#).unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_malformed_pair_elements_are_dropped() {
        let entries = parse(r#"[["Healthy", 1], ["Red scale"], 7, [3, 4], ["Red scale", 2, 9]]"#).unwrap();
        assert_eq!(entries, vec![NormalizedEntry::new("Healthy", 1.0)]);
    }

    #[test]
    fn test_negative_pair_values_are_dropped() {
        let entries =
            parse(r#"[["Healthy", -3], ["Red scale", 2], ["Citrus leafminer", "-1"]]"#).unwrap();
        assert_eq!(entries, vec![NormalizedEntry::new("Red scale", 2.0)]);
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert!(matches!(parse("not json"), Err(AnalysisError::MalformedPayload(_))));
        assert!(matches!(parse(""), Err(AnalysisError::MalformedPayload(_))));
    }

    #[test]
    fn test_scalar_documents_are_malformed() {
        for raw in ["5", "\"Healthy\"", "null", "true"] {
            assert!(
                matches!(parse(raw), Err(AnalysisError::MalformedPayload(_))),
                "{raw} should be malformed"
            );
        }
    }

    #[test]
    fn test_empty_object_is_valid_and_empty() {
        assert_eq!(parse("{}").unwrap(), Vec::new());
    }
}
