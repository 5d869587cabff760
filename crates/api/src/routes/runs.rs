//! Route definitions for run endpoints.
//!
//! Mounted at `/runs` within the `/api/v1` tree.
//!
//! ```text
//! GET    /{id}             -> get_run
//! GET    /{id}/attempts    -> list_attempts
//! GET    /{id}/diagram     -> get_diagram (?attempt=N)
//! ```

use axum::routing::get;
use axum::Router;

use crate::handlers::runs;
use crate::state::AppState;

/// Build the `/runs` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(runs::get_run))
        .route("/{id}/attempts", get(runs::list_attempts))
        .route("/{id}/diagram", get(runs::get_diagram))
}
