//! Line-delimited record batches, the unit every cleaning stage works on.

use crate::error::PipelineError;
use serde_json::{Map, Value};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// One raw record: a flat JSON object keyed by source field name.
pub type Record = Map<String, Value>;

/// All records from one department export file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    rows: Vec<Record>,
}

impl RecordBatch {
    pub fn new(rows: Vec<Record>) -> Self {
        Self { rows }
    }

    /// Read a batch from a JSONL file, one object per line.
    ///
    /// Blank lines are skipped; a line that is not a JSON object fails the
    /// whole batch, since a half-read export must not be loaded.
    pub fn from_jsonl(path: &Path) -> Result<Self, PipelineError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let mut rows = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(&line).map_err(|source| {
                PipelineError::MalformedRecord {
                    line: idx + 1,
                    source,
                }
            })?;
            rows.push(record);
        }

        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Record] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Record> {
        self.rows
    }

    /// Iterate one field across all rows; absent fields read as null.
    pub fn column<'a>(&'a self, field: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .map(move |row| row.get(field).unwrap_or(&Value::Null))
    }
}

/// Whether a value counts as missing for imputation purposes.
pub fn is_missing(value: &Value) -> bool {
    value.is_null()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(m) => m,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_from_jsonl_skips_blank_lines() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("objects.jsonl");
        std::fs::write(
            &path,
            "{\"objectID\": 1, \"title\": \"Vase\"}\n\n{\"objectID\": 2, \"title\": \"Bowl\"}\n",
        )
        .unwrap();

        let batch = RecordBatch::from_jsonl(&path).unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows()[1]["objectID"], json!(2));
    }

    #[test]
    fn test_from_jsonl_reports_bad_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("objects.jsonl");
        std::fs::write(&path, "{\"objectID\": 1}\nnot json\n").unwrap();

        let err = RecordBatch::from_jsonl(&path).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_column_reads_absent_as_null() {
        let batch = RecordBatch::new(vec![
            record(json!({"height": 10.0})),
            record(json!({"title": "no height"})),
        ]);
        let values: Vec<&Value> = batch.column("height").collect();
        assert_eq!(values[0], &json!(10.0));
        assert!(values[1].is_null());
    }
}
