pub mod health;
pub mod pipeline;
pub mod runs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /pipeline/stages                 stage contracts and flow edges
///
/// /runs/{id}                       run detail snapshot
/// /runs/{id}/attempts              attempts with recorded activity
/// /runs/{id}/diagram               run diagram (?attempt=N)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/pipeline", pipeline::router())
        .nest("/runs", runs::router())
}
