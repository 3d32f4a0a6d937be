//! The relational store: schema, deduplicating loader, and read queries.

pub mod loader;
pub mod queries;
pub mod schema;

pub use loader::{DepartmentLoad, LoadReport};
pub use queries::{collapse_small_groups, DetailRecord, GroupCount, GroupField, IntegrityReport};
pub use schema::CollectionStore;
