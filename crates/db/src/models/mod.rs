//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A conversion into the matching `aac_core::run_records` type

pub mod asset;
pub mod prompt;
pub mod run;
pub mod score;
pub mod stage_result;
