//! Empty-string scrubbing, the first cleaning stage.

use crate::ingest::batch::{Record, RecordBatch};
use serde_json::Value;

/// Replace every empty-string field value with null, uniformly across all
/// columns.
///
/// Produces a new batch; the input is untouched. Only top-level values are
/// inspected: nested arrays and objects (raw measurement structures and the
/// like) pass through unchanged, as do all non-string values.
pub fn normalize(batch: &RecordBatch) -> RecordBatch {
    let rows = batch
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(s) if s.is_empty() => Value::Null,
                        other => other.clone(),
                    };
                    (key.clone(), value)
                })
                .collect::<Record>()
        })
        .collect();

    RecordBatch::new(rows)
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
    fn test_empty_strings_become_null() {
        let batch = batch_of(vec![json!({
            "title": "",
            "culture": "Egyptian",
            "period": "",
        })]);

        let cleaned = normalize(&batch);
        let row = &cleaned.rows()[0];
        assert!(row["title"].is_null());
        assert_eq!(row["culture"], json!("Egyptian"));
        assert!(row["period"].is_null());
    }

    #[test]
    fn test_non_strings_untouched() {
        let batch = batch_of(vec![json!({
            "objectID": 0,
            "isHighlight": false,
            "height": 0.0,
            "measurements": [{"elementMeasurements": {"Height": ""}}],
        })]);

        let cleaned = normalize(&batch);
        let row = &cleaned.rows()[0];
        assert_eq!(row["objectID"], json!(0));
        assert_eq!(row["isHighlight"], json!(false));
        assert_eq!(row["height"], json!(0.0));
        // Nested empties are left alone; only top-level values are scrubbed.
        assert_eq!(
            row["measurements"],
            json!([{"elementMeasurements": {"Height": ""}}])
        );
    }

    #[test]
    fn test_source_batch_not_mutated() {
        let batch = batch_of(vec![json!({"title": ""})]);
        let _ = normalize(&batch);
        assert_eq!(batch.rows()[0]["title"], json!(""));
    }
}
