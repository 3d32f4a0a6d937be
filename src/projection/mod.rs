//! Projection from cleaned record batches into target-table rows.

pub mod projector;
pub mod rows;

pub use projector::{project_batch, project_departments, ProjectedBatch};
pub use rows::{ArtRow, ArtistRow, DepartmentRow, ObjectLinkRow};
