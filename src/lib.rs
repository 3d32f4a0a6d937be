//! Vitrine: harvest, clean, and query a museum collection.
//!
//! The crate is a pipeline in four stages: [`acquisition`] pulls object
//! records from the public collection API into per-department JSONL
//! exports, [`ingest`] normalizes and imputes them, [`projection`] shapes
//! them into relational rows, and [`store`] loads and queries the SQLite
//! database. [`pipeline`] drives the cleaning stages end to end.

pub mod acquisition;
pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod projection;
pub mod store;

pub use error::PipelineError;
