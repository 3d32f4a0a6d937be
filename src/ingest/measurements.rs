//! Physical-dimension extraction from raw measurement structures.

use crate::ingest::batch::{Record, RecordBatch};
use serde_json::Value;

/// Element keys as they appear in the source API's measurement blocks.
const ELEMENTS: [(&str, &str); 3] = [
    ("Height", "height"),
    ("Width", "width"),
    ("Length", "length"),
];

/// Lift `Height`/`Width`/`Length` readings out of each record's
/// `measurements` array into top-level `height`/`width`/`length` columns.
///
/// The first measurement block carrying a given element wins. A record with
/// no usable reading simply ends up without that column, which downstream
/// imputation treats as missing. The consumed `measurements` array is dropped
/// from the output.
pub fn lift_dimensions(batch: &RecordBatch) -> RecordBatch {
    let rows = batch
        .rows()
        .iter()
        .map(|row| {
            let mut out: Record = row.clone();
            for (element, column) in ELEMENTS {
                if out.get(column).is_some_and(|v| !v.is_null()) {
                    continue;
                }
                if let Some(reading) = first_reading(row, element) {
                    if let Some(n) = serde_json::Number::from_f64(reading) {
                        out.insert(column.to_string(), Value::Number(n));
                    }
                }
            }
            out.remove("measurements");
            out
        })
        .collect();

    RecordBatch::new(rows)
}

/// Scan the measurements array for the first block that has a numeric
/// reading for `element`.
fn first_reading(record: &Record, element: &str) -> Option<f64> {
    let blocks = record.get("measurements")?.as_array()?;
    for block in blocks {
        let Some(readings) = block.get("elementMeasurements").and_then(|v| v.as_object()) else {
            continue;
        };
        if let Some(n) = readings.get(element).and_then(|v| v.as_f64()) {
            return Some(n);
        }
    }
    None
}
