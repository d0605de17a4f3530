//! Flat tabular export (one row per observation) and CSV serialization

use std::borrow::Cow;

use serde::Serialize;
use tracing::debug;

use super::aggregate::aggregate_one;
use super::catalog::NO_RECOMMENDATION;
use super::dominance::resolve;
use super::{AnalysisConfig, Observation};
use crate::time;

/// CSV header, in [`Row`] field order
pub const HEADER: [&str; 8] = [
    "Index",
    "Date",
    "Time",
    "Tree ID",
    "Dominant Disease",
    "Dominant Value",
    "Other Diseases",
    "Recommendations",
];

/// One exported observation
///
/// Dominant and other-category columns hold raw accumulated values, not
/// percentages. Observations without data keep their row with those columns
/// empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// 1-based position in the input
    pub index: usize,
    pub date: String,
    pub time: String,
    pub tree_id: String,
    pub dominant_category: String,
    pub dominant_value: String,
    /// `name:value` pairs joined by `;`
    pub other_category_values: String,
    pub recommendation_text: String,
}

impl Row {
    fn fields(&self) -> [Cow<'_, str>; 8] {
        [
            Cow::Owned(self.index.to_string()),
            Cow::Borrowed(&self.date),
            Cow::Borrowed(&self.time),
            Cow::Borrowed(&self.tree_id),
            Cow::Borrowed(&self.dominant_category),
            Cow::Borrowed(&self.dominant_value),
            Cow::Borrowed(&self.other_category_values),
            Cow::Borrowed(&self.recommendation_text),
        ]
    }
}

/// Export one row per observation, in input order
pub fn export(observations: &[Observation], config: &AnalysisConfig) -> Vec<Row> {
    observations
        .iter()
        .enumerate()
        .map(|(position, observation)| export_row(position + 1, observation, config))
        .collect()
}

fn export_row(index: usize, observation: &Observation, config: &AnalysisConfig) -> Row {
    let mut row = Row {
        index,
        date: time::format_date(&observation.timestamp),
        time: time::format_time(&observation.timestamp),
        tree_id: observation.tree_label().unwrap_or_default().to_string(),
        dominant_category: String::new(),
        dominant_value: String::new(),
        other_category_values: String::new(),
        recommendation_text: String::new(),
    };

    let distribution = match aggregate_one(
        observation,
        config.catalog.categories(),
        config.unknown_categories,
    ) {
        Ok(distribution) => distribution,
        Err(e) => {
            debug!("Observation {} exported without findings: {}", observation.id, e);
            return row;
        }
    };

    let dominant = resolve(&distribution);
    if dominant.is_no_data() {
        return row;
    }

    let mut others = Vec::new();
    for share in distribution.iter() {
        if share.category == dominant.category {
            row.dominant_value = format_value(share.total);
        } else if share.observed {
            others.push(format!("{}:{}", share.category, format_value(share.total)));
        }
    }
    row.other_category_values = others.join(";");

    let actions = config.catalog.recommend(&dominant.category);
    row.recommendation_text = if actions.is_empty() {
        NO_RECOMMENDATION.to_string()
    } else {
        actions.join("; ")
    };
    row.dominant_category = dominant.category;

    row
}

/// Shortest decimal form (`80`, `12.5`)
fn format_value(value: f64) -> String {
    format!("{}", value)
}

/// Serialize rows as CSV with a header line
pub fn to_csv(rows: &[Row]) -> String {
    let mut out = String::new();
    push_record(&mut out, HEADER.iter().map(|h| Cow::Borrowed(*h)));
    for row in rows {
        push_record(&mut out, row.fields().into_iter());
    }
    out
}

fn push_record<'a>(out: &mut String, fields: impl Iterator<Item = Cow<'a, str>>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(&field));
    }
    out.push('\n');
}

/// Quote a field when it contains the delimiter, a quote or a line break
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{RecommendationCatalog, UnknownCategoryPolicy};
    use chrono::{TimeZone, Utc};

    fn obs(id: i64, tree: Option<&str>, raw: &str) -> Observation {
        Observation::new(
            id,
            tree.map(str::to_string),
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 30, 5).unwrap(),
            raw,
        )
    }

    #[test]
    fn test_row_for_valid_observation() {
        let rows = export(
            &[obs(1, Some("T1"), r#"{"Healthy": 80, "Red scale": 20}"#)],
            &AnalysisConfig::default(),
        );
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.index, 1);
        assert_eq!(row.date, "2024-05-01");
        assert_eq!(row.time, "08:30:05");
        assert_eq!(row.tree_id, "T1");
        assert_eq!(row.dominant_category, "Healthy");
        assert_eq!(row.dominant_value, "80");
        assert_eq!(row.other_category_values, "Red scale:20");
        assert_eq!(
            row.recommendation_text,
            "Maintain proper watering.; Ensure good soil health.; Regularly inspect for pests or diseases."
        );
    }

    #[test]
    fn test_other_values_are_raw_not_percentages() {
        let rows = export(
            &[obs(1, None, r#"{"Citrus leafminer": 0.5, "Healthy": 0.25, "Red scale": 0.25}"#)],
            &AnalysisConfig::default(),
        );
        assert_eq!(rows[0].dominant_value, "0.5");
        assert_eq!(rows[0].other_category_values, "Healthy:0.25;Red scale:0.25");
    }

    #[test]
    fn test_malformed_rows_are_kept() {
        let rows = export(
            &[
                obs(1, Some("T1"), "not json"),
                obs(2, Some("T2"), r#"{"Healthy": 1}"#),
                obs(3, None, "{}"),
            ],
            &AnalysisConfig::default(),
        );
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].tree_id, "T1");
        assert_eq!(rows[0].dominant_category, "");
        assert_eq!(rows[0].dominant_value, "");
        assert_eq!(rows[0].other_category_values, "");
        assert_eq!(rows[0].recommendation_text, "");
        assert_eq!(rows[1].dominant_category, "Healthy");
        assert_eq!(rows[1].other_category_values, "");
        assert_eq!(rows[2].dominant_category, "");
        assert_eq!(rows.iter().map(|r| r.index).collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_rows_follow_input_order() {
        let rows = export(
            &[obs(9, Some("B"), r#"{"Healthy": 1}"#), obs(3, Some("A"), r#"{"Red scale": 1}"#)],
            &AnalysisConfig::default(),
        );
        assert_eq!(rows[0].tree_id, "B");
        assert_eq!(rows[1].tree_id, "A");
    }

    #[test]
    fn test_unknown_dominant_gets_fallback_text() {
        let config = AnalysisConfig::new(RecommendationCatalog::default(), UnknownCategoryPolicy::Include);
        let rows = export(&[obs(1, None, r#"{"Greening": 5, "Healthy": 1}"#)], &config);
        assert_eq!(rows[0].dominant_category, "Greening");
        assert_eq!(rows[0].other_category_values, "Healthy:1");
        assert_eq!(rows[0].recommendation_text, NO_RECOMMENDATION);
    }

    #[test]
    fn test_unknown_categories_left_out_when_excluded() {
        let rows = export(
            &[obs(1, None, r#"{"Greening": 5, "Healthy": 1}"#)],
            &AnalysisConfig::default(),
        );
        assert_eq!(rows[0].dominant_category, "Healthy");
        assert_eq!(rows[0].other_category_values, "");
    }

    #[test]
    fn test_csv_header_and_quoting() {
        let rows = export(
            &[obs(1, Some("North, row \"3\""), r#"{"Healthy": 80, "Red scale": 20}"#)],
            &AnalysisConfig::default(),
        );
        let csv = to_csv(&rows);
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Index,Date,Time,Tree ID,Dominant Disease,Dominant Value,Other Diseases,Recommendations"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,2024-05-01,08:30:05,\"North, row \"\"3\"\"\",Healthy,80,Red scale:20,\
             Maintain proper watering.; Ensure good soil health.; Regularly inspect for pests or diseases."
        );
        assert!(csv.ends_with('\n'));
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("a,b"), "\"a,b\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn test_csv_of_no_rows_is_header_only() {
        assert_eq!(to_csv(&[]).lines().count(), 1);
    }
}
