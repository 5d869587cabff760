//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod asset_repo;
pub mod prompt_repo;
pub mod run_detail_repo;
pub mod run_repo;
pub mod score_repo;
pub mod stage_result_repo;

pub use asset_repo::AssetRepo;
pub use prompt_repo::PromptRepo;
pub use run_detail_repo::RunDetailRepo;
pub use run_repo::RunRepo;
pub use score_repo::ScoreRepo;
pub use stage_result_repo::StageResultRepo;
