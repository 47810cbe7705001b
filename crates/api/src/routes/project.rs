//! Route definitions for the `/projects` resource.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::project;
use crate::state::AppState;

/// Routes mounted at `/projects`.
///
/// ```text
/// GET    /                              -> list
/// POST   /                              -> create
/// GET    /{id}                          -> get_by_id
/// GET    /{id}/requests                 -> list_requests (?role=&acceptance=)
/// GET    /{id}/candidates               -> candidates (?role=&longitude=&latitude=&radius_km=)
/// GET    /{id}/roles/ongoing            -> ongoing_roles
/// GET    /{id}/roles/accepted           -> accepted_roles
/// DELETE /{id}/roles/{role}/pending     -> purge_unaccepted
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(project::list).post(project::create))
        .route("/{id}", get(project::get_by_id))
        .route("/{id}/requests", get(project::list_requests))
        .route("/{id}/candidates", get(project::candidates))
        .route("/{id}/roles/ongoing", get(project::ongoing_roles))
        .route("/{id}/roles/accepted", get(project::accepted_roles))
        .route(
            "/{id}/roles/{role}/pending",
            delete(project::purge_unaccepted),
        )
}
