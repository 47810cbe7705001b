pub mod admin;
pub mod health;
pub mod project;
pub mod request;
pub mod vendor;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /projects/...        organizer projects, role views, candidates
/// /requests/...        dispatch, negotiation, progress, reviews
/// /vendors/...         vendor directory and reviews
/// /admin/...           profiles and ledger maintenance (admin only)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/projects", project::router())
        .nest("/requests", request::router())
        .nest("/vendors", vendor::router())
        .nest("/admin", admin::router())
}
