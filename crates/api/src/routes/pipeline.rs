//! Route definitions for the static pipeline description.
//!
//! Mounted at `/pipeline` within the `/api/v1` tree.

use axum::routing::get;
use axum::Router;

use crate::handlers::pipeline;
use crate::state::AppState;

/// Build the `/pipeline` router.
pub fn router() -> Router<AppState> {
    Router::new().route("/stages", get(pipeline::get_stages))
}
