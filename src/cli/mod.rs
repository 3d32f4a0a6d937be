//! CLI subcommand implementations for the Vitrine binary.

pub mod build_cmd;
pub mod harvest_cmd;
pub mod output;
pub mod query_cmd;
pub mod status;
pub mod verify_cmd;
