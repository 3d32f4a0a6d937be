//! Harvesting the museum's public API into per-department JSONL exports.

pub mod client;
pub mod harvester;
pub mod progress;
pub mod rate_limiter;

pub use client::{ApiDepartment, CollectionClient, ObjectFetch};
pub use harvester::{HarvestOptions, HarvestReport, Harvester};
pub use progress::{Progress, SessionStats};
pub use rate_limiter::RateLimiter;
