//! Request handlers.
//!
//! Each submodule provides async handler functions for one resource.
//! Handlers delegate to `aac_db` repositories for loading and to
//! `aac_core` for projection, and map errors via [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod pipeline;
pub mod runs;
