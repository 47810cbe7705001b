//! Route definitions for the `/vendors` directory.

use axum::routing::get;
use axum::Router;

use crate::handlers::vendor;
use crate::state::AppState;

/// Routes mounted at `/vendors`.
///
/// ```text
/// GET    /                 -> list_by_role (?role=)
/// GET    /{id}             -> get_by_id
/// GET    /{id}/reviews     -> reviews
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(vendor::list_by_role))
        .route("/{id}", get(vendor::get_by_id))
        .route("/{id}/reviews", get(vendor::reviews))
}
