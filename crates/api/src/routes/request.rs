//! Route definitions for the `/requests` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::request;
use crate::state::AppState;

/// Routes mounted at `/requests`.
///
/// ```text
/// GET    /                          -> list_sent (user)
/// POST   /                          -> dispatch (user)
/// GET    /inbox                     -> inbox (vendor)
/// GET    /{id}                      -> get_by_id (either party)
/// DELETE /{id}                      -> delete (requesting user)
/// POST   /{id}/vendor-response      -> vendor_response
/// POST   /{id}/user-response        -> user_response
/// GET    /{id}/progress             -> get_progress
/// PUT    /{id}/progress             -> set_progress_step
/// GET    /{id}/review               -> review_status
/// POST   /{id}/review               -> submit_review
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(request::list_sent).post(request::dispatch))
        .route("/inbox", get(request::inbox))
        .route("/{id}", get(request::get_by_id).delete(request::delete))
        .route("/{id}/vendor-response", post(request::vendor_response))
        .route("/{id}/user-response", post(request::user_response))
        .route(
            "/{id}/progress",
            get(request::get_progress).put(request::set_progress_step),
        )
        .route(
            "/{id}/review",
            get(request::review_status).post(request::submit_review),
        )
}
