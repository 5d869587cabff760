//! Domain logic for the AAC image generation backend.
//!
//! This crate has no database or HTTP dependencies. Everything here
//! operates on data already loaded by the caller.

pub mod attempts;
pub mod error;
pub mod pipeline_stages;
pub mod run_diagram;
pub mod run_records;
pub mod run_status;
pub mod stage_status;
pub mod types;

pub use attempts::list_attempts;
pub use run_diagram::project;
