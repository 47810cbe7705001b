//! Route definitions for `/admin`.

use axum::routing::post;
use axum::Router;

use crate::handlers::admin;
use crate::state::AppState;

/// Routes mounted at `/admin`. Every handler requires the admin role.
///
/// ```text
/// POST   /users                  -> create_user
/// POST   /vendors                -> create_vendor
/// POST   /retractions/resume     -> resume_retractions
/// POST   /mirrors/reconcile      -> reconcile_mirrors
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(admin::create_user))
        .route("/vendors", post(admin::create_vendor))
        .route("/retractions/resume", post(admin::resume_retractions))
        .route("/mirrors/reconcile", post(admin::reconcile_mirrors))
}
