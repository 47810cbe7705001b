//! Handlers for the `/requests` resource: dispatch, negotiation, progress
//! and reviews.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;
use vendorlink_core::geo::GeoPoint;
use vendorlink_core::negotiation::VendorAction;
use vendorlink_core::progress::ProgressStep;
use vendorlink_core::types::{DbId, Timestamp};
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::vendor_request::VendorRequest;

use crate::engine::ledger::{Removal, RequestDraft};
use crate::engine::negotiation::{ResponseOutcome, VendorResponse};
use crate::engine::progress::ReviewOutcome;
use crate::error::AppResult;
use crate::middleware::rbac::{RequireAuth, RequireUser, RequireVendor};
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct DispatchRequest {
    pub project_id: DbId,
    #[validate(length(min = 1, max = 50))]
    pub vendor_ids: Vec<DbId>,
    pub role: String,
    pub location: GeoPoint,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    #[validate(length(min = 1, max = 5000))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VendorResponseRequest {
    /// `accept` or `reject`.
    pub action: String,
    #[validate(range(min = 0.0))]
    pub budget: Option<f64>,
    #[validate(length(max = 5000))]
    pub additional_details: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserResponseRequest {
    pub accept: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SetStepRequest {
    #[validate(length(min = 1))]
    pub step: String,
    pub done: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReviewRequest {
    pub rating: i16,
    #[validate(length(min = 1, max = 2000))]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ReviewStatus {
    pub reviewed: bool,
}

/// POST /api/v1/requests
///
/// Sends one request per vendor id; all are validated before any is written.
pub async fn dispatch(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(input): Json<DispatchRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Vec<VendorRequest>>>)> {
    input.validate()?;
    let draft = RequestDraft {
        project_id: input.project_id,
        role: VendorRole::parse(&input.role)?,
        location: input.location,
        start_at: input.start_at,
        end_at: input.end_at,
        description: input.description,
    };
    let created = state
        .ledger()
        .dispatch(&user.caller(), &input.vendor_ids, &draft)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/requests
pub async fn list_sent(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> AppResult<Json<DataResponse<Vec<VendorRequest>>>> {
    let requests = state.ledger().sent_requests(&user.caller()).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/requests/inbox
pub async fn inbox(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
) -> AppResult<Json<DataResponse<Vec<VendorRequest>>>> {
    let requests = state.ledger().inbox(&vendor.caller()).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/requests/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<VendorRequest>>> {
    let request = state.ledger().get_for(&caller.caller(), id).await?;
    Ok(Json(DataResponse { data: request }))
}

/// DELETE /api/v1/requests/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Removal>>> {
    let removal = state.ledger().delete(&caller.caller(), id).await?;
    Ok(Json(DataResponse { data: removal }))
}

/// POST /api/v1/requests/{id}/vendor-response
pub async fn vendor_response(
    State(state): State<AppState>,
    RequireVendor(vendor): RequireVendor,
    Path(id): Path<DbId>,
    Json(input): Json<VendorResponseRequest>,
) -> AppResult<Json<DataResponse<ResponseOutcome>>> {
    input.validate()?;
    let response = VendorResponse {
        action: VendorAction::parse(&input.action)?,
        budget: input.budget,
        additional_details: input.additional_details,
    };
    let outcome = state
        .negotiation()
        .respond_as_vendor(&vendor.caller(), id, response)
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// POST /api/v1/requests/{id}/user-response
pub async fn user_response(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<DbId>,
    Json(input): Json<UserResponseRequest>,
) -> AppResult<Json<DataResponse<ResponseOutcome>>> {
    let outcome = state
        .negotiation()
        .respond_as_user(&user.caller(), id, input.accept)
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/requests/{id}/progress
pub async fn get_progress(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<ProgressStep>>>> {
    let steps = state.progress().get_progress(&caller.caller(), id).await?;
    Ok(Json(DataResponse { data: steps }))
}

/// PUT /api/v1/requests/{id}/progress
pub async fn set_progress_step(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<DbId>,
    Json(input): Json<SetStepRequest>,
) -> AppResult<Json<DataResponse<Vec<ProgressStep>>>> {
    input.validate()?;
    let steps = state
        .progress()
        .set_progress_step(&caller.caller(), id, &input.step, input.done)
        .await?;
    Ok(Json(DataResponse { data: steps }))
}

/// POST /api/v1/requests/{id}/review
pub async fn submit_review(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<ReviewOutcome>>)> {
    input.validate()?;
    let outcome = state
        .progress()
        .submit_review(&user.caller(), id, input.rating, &input.message)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: outcome })))
}

/// GET /api/v1/requests/{id}/review
pub async fn review_status(
    State(state): State<AppState>,
    RequireAuth(caller): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ReviewStatus>>> {
    let reviewed = state.progress().review_status(&caller.caller(), id).await?;
    Ok(Json(DataResponse {
        data: ReviewStatus { reviewed },
    }))
}
