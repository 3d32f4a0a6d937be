//! Field-level fill rules for missing values.
//!
//! The historical cleaning scripts disagreed on what to do with gaps
//! (zero-fill here, sentinel there, untouched elsewhere), so the rules live
//! in one declared policy instead of being hard-coded per dataset.

use crate::error::PipelineError;
use crate::ingest::batch::{is_missing, Record, RecordBatch};
use serde_json::Value;
use tracing::warn;

/// The sentinel written into intentionally-imputed text gaps.
pub const UNKNOWN: &str = "Unknown";

/// What to do with a missing value in one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FillRule {
    /// Fill with the literal "Unknown" sentinel.
    Unknown,
    /// Fill with zero. For dimensions with a natural default, like depth of
    /// a flat work.
    Zero,
    /// Fill with the batch median of the non-missing values.
    Median,
    /// Leave missing. For keys and foreign keys, where a fabricated value
    /// would fabricate a relationship.
    Never,
}

/// Declared per-field fill rules for one record shape.
#[derive(Debug, Clone, Default)]
pub struct ImputationPolicy {
    rules: Vec<(&'static str, FillRule)>,
}

impl ImputationPolicy {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn with_rule(mut self, field: &'static str, rule: FillRule) -> Self {
        self.rules.push((field, rule));
        self
    }

    /// Standard policy for object records.
    ///
    /// Text metadata and the raw date years get the sentinel, `length`
    /// defaults to zero, `height`/`width` take the batch median, and the
    /// artist link is left honestly absent.
    pub fn objects() -> Self {
        let text_fields = [
            "accessionYear",
            "primaryImage",
            "objectName",
            "title",
            "culture",
            "period",
            "dynasty",
            "reign",
            "portfolio",
            "objectBeginDate",
            "objectEndDate",
            "city",
            "state",
            "county",
            "country",
            "region",
            "subregion",
            "excavation",
            "classification",
        ];
        let mut policy = Self::new();
        for field in text_fields {
            policy = policy.with_rule(field, FillRule::Unknown);
        }
        policy
            .with_rule("height", FillRule::Median)
            .with_rule("width", FillRule::Median)
            .with_rule("length", FillRule::Zero)
            .with_rule("artistAlphaSort", FillRule::Never)
    }

    /// Standard policy for artist records. The sort-name key is never
    /// imputed; keyless rows are excluded at projection instead.
    pub fn artists() -> Self {
        Self::new()
            .with_rule("artist_name", FillRule::Unknown)
            .with_rule("artistNationality", FillRule::Unknown)
            .with_rule("artistBeginDate", FillRule::Unknown)
            .with_rule("artistEndDate", FillRule::Unknown)
            .with_rule("artistAlphaSort", FillRule::Never)
    }

    pub fn rules(&self) -> &[(&'static str, FillRule)] {
        &self.rules
    }

    /// Apply the policy, producing a filled copy of the batch.
    ///
    /// A `Median` rule over a column with zero non-missing values cannot
    /// produce a number; that field is skipped for the batch and a warning
    /// logged, leaving its gaps null.
    pub fn apply(&self, batch: &RecordBatch) -> RecordBatch {
        let mut rows: Vec<Record> = batch.rows().to_vec();

        for &(field, rule) in &self.rules {
            let fill = match rule {
                FillRule::Unknown => Value::String(UNKNOWN.to_string()),
                FillRule::Zero => Value::from(0.0),
                FillRule::Median => {
                    let observed = numeric_column(batch, field);
                    match median(field, &observed) {
                        Ok(m) => Value::from(m),
                        Err(e) => {
                            warn!("skipping imputation: {e}");
                            continue;
                        }
                    }
                }
                FillRule::Never => continue,
            };

            for row in &mut rows {
                let current = row.get(field);
                if current.is_none() || current.is_some_and(is_missing) {
                    row.insert(field.to_string(), fill.clone());
                }
            }
        }

        RecordBatch::new(rows)
    }
}

/// Median of a sorted copy of `values`; the mean of the two middle values
/// when the count is even.
pub fn median(field: &str, values: &[f64]) -> Result<f64, PipelineError> {
    if values.is_empty() {
        return Err(PipelineError::EmptyMedianInput {
            field: field.to_string(),
        });
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[mid])
    } else {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Collect the non-missing numeric values of one column.
fn numeric_column(batch: &RecordBatch, field: &str) -> Vec<f64> {
    batch
        .column(field)
        .filter_map(|v| v.as_f64())
        .filter(|n| n.is_finite())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn batch_of(values: Vec<serde_json::Value>) -> RecordBatch {
        RecordBatch::new(
            values
                .into_iter()
                .map(|v| match v {
                    Value::Object(m) => m,
                    _ => panic!("expected object"),
                })
                .collect(),
        )
    }

    #[test]
    fn test_median_fill() {
        let batch = batch_of(vec![
            json!({"height": 10.0}),
            json!({"height": null}),
            json!({"height": 20.0}),
        ]);
        let policy = ImputationPolicy::new().with_rule("height", FillRule::Median);

        let filled = policy.apply(&batch);
        assert_eq!(filled.rows()[1]["height"], json!(15.0));
        // Observed values are untouched.
        assert_eq!(filled.rows()[0]["height"], json!(10.0));
        assert_eq!(filled.rows()[2]["height"], json!(20.0));
    }

    #[test]
    fn test_median_odd_count() {
        assert_eq!(median("height", &[3.0, 1.0, 2.0]).unwrap(), 2.0);
        assert_eq!(median("height", &[5.0]).unwrap(), 5.0);
    }

    #[test]
    fn test_median_empty_is_guarded() {
        let err = median("height", &[]).unwrap_err();
        assert!(matches!(err, PipelineError::EmptyMedianInput { .. }));
        assert!(err.to_string().contains("height"));
    }

    #[test]
    fn test_all_missing_column_skipped_not_undefined() {
        let batch = batch_of(vec![json!({"height": null}), json!({"title": "x"})]);
        let policy = ImputationPolicy::new().with_rule("height", FillRule::Median);

        let filled = policy.apply(&batch);
        assert!(filled.rows()[0]["height"].is_null());
        assert!(!filled.rows()[1].contains_key("height"));
    }

    #[test]
    fn test_unknown_fill_covers_absent_columns() {
        let batch = batch_of(vec![json!({"title": null}), json!({"culture": "Roman"})]);
        let policy = ImputationPolicy::new()
            .with_rule("title", FillRule::Unknown)
            .with_rule("culture", FillRule::Unknown);

        let filled = policy.apply(&batch);
        assert_eq!(filled.rows()[0]["title"], json!(UNKNOWN));
        assert_eq!(filled.rows()[0]["culture"], json!(UNKNOWN));
        assert_eq!(filled.rows()[1]["culture"], json!("Roman"));
        assert_eq!(filled.rows()[1]["title"], json!(UNKNOWN));
    }

    #[test]
    fn test_zero_fill() {
        let batch = batch_of(vec![json!({"length": null, "height": 4.0})]);
        let policy = ImputationPolicy::new().with_rule("length", FillRule::Zero);

        let filled = policy.apply(&batch);
        assert_eq!(filled.rows()[0]["length"], json!(0.0));
    }

    #[test]
    fn test_foreign_key_never_imputed() {
        let batch = batch_of(vec![json!({"artistAlphaSort": null, "title": null})]);
        let policy = ImputationPolicy::objects();

        let filled = policy.apply(&batch);
        assert!(filled.rows()[0]["artistAlphaSort"].is_null());
        assert_eq!(filled.rows()[0]["title"], json!(UNKNOWN));
    }

    #[test]
    fn test_artist_key_never_imputed() {
        let batch = batch_of(vec![json!({"artist_name": null, "artistAlphaSort": null})]);
        let filled = ImputationPolicy::artists().apply(&batch);
        assert_eq!(filled.rows()[0]["artist_name"], json!(UNKNOWN));
        assert!(filled.rows()[0]["artistAlphaSort"].is_null());
    }
}
