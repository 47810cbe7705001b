//! Admin-only handlers: profile creation and ledger maintenance.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use vendorlink_core::geo::GeoPoint;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::user::{CreateUser, User};
use vendorlink_db::models::vendor::{CreateVendor, Vendor};

use crate::engine::negotiation::ResumeReport;
use crate::engine::reconcile::ReconcileReport;
use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: String,
    #[validate(url)]
    pub profile_image: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateVendorRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 5, max = 20))]
    pub phone: String,
    pub role: String,
    #[validate(length(max = 5000))]
    #[serde(default)]
    pub description: String,
    pub location: GeoPoint,
    #[validate(url)]
    pub profile_image: Option<String>,
    #[serde(default)]
    pub work_images: Vec<String>,
}

/// POST /api/v1/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<User>>)> {
    input.validate()?;
    let create = CreateUser {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_lowercase(),
        phone: input.phone,
        profile_image: input.profile_image,
    };
    let user = state.profiles().create_user(&admin.caller(), &create).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: user })))
}

/// POST /api/v1/admin/vendors
pub async fn create_vendor(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<CreateVendorRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vendor>>)> {
    input.validate()?;
    let create = CreateVendor {
        name: input.name.trim().to_string(),
        email: input.email.trim().to_lowercase(),
        phone: input.phone,
        role: VendorRole::parse(&input.role)?,
        description: input.description,
        location: input.location,
        profile_image: input.profile_image,
        work_images: input.work_images,
    };
    let vendor = state
        .profiles()
        .create_vendor(&admin.caller(), &create)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: vendor })))
}

/// POST /api/v1/admin/retractions/resume
pub async fn resume_retractions(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<DataResponse<ResumeReport>>> {
    let report = state
        .negotiation()
        .resume_pending_retractions(&admin.caller())
        .await?;
    Ok(Json(DataResponse { data: report }))
}

/// POST /api/v1/admin/mirrors/reconcile
pub async fn reconcile_mirrors(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
) -> AppResult<Json<DataResponse<ReconcileReport>>> {
    let report = state.reconciler().reconcile_mirrors(&admin.caller()).await?;
    Ok(Json(DataResponse { data: report }))
}
