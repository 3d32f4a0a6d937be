//! Error taxonomy for the clean-and-build pipeline.

use thiserror::Error;

/// Errors raised while cleaning, projecting, or loading a record batch.
///
/// Cleaning and projection failures are local to one department's batch;
/// the driver logs them and moves on. Loader failures mean a cross-batch
/// integrity break and abort the run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required target column has no value after imputation.
    #[error("required field `{field}` missing from {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    /// A primary key arrived a second time with conflicting content.
    #[error("duplicate key in {table}: `{key}` already stored with a different {conflict}")]
    DuplicateKey {
        table: &'static str,
        key: String,
        conflict: &'static str,
    },

    /// An object row references a department the store does not know.
    #[error("object {object_id} references unknown department {department_id}")]
    OrphanDepartment {
        object_id: i64,
        department_id: i64,
    },

    /// Median imputation requested for a column with zero non-missing values.
    #[error("column `{field}` has no non-missing values to take a median over")]
    EmptyMedianInput { field: String },

    /// A source line that is not a valid JSON object.
    #[error("malformed record on line {line}: {source}")]
    MalformedRecord {
        line: usize,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
