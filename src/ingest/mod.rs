//! Cleaning stages that turn raw per-department exports into uniform batches.

pub mod batch;
pub mod imputation;
pub mod measurements;
pub mod normalizer;

pub use batch::{Record, RecordBatch};
pub use imputation::{FillRule, ImputationPolicy, UNKNOWN};
pub use measurements::lift_dimensions;
pub use normalizer::normalize;
