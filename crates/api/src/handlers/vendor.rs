//! Handlers for the `/vendors` directory.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::vendor::{Vendor, VendorReview};

use crate::error::AppResult;
use crate::middleware::rbac::RequireAuth;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleParams {
    pub role: String,
}

/// GET /api/v1/vendors?role=
pub async fn list_by_role(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Query(params): Query<RoleParams>,
) -> AppResult<Json<DataResponse<Vec<Vendor>>>> {
    let role = VendorRole::parse(&params.role)?;
    let vendors = state.profiles().vendors_by_role(role).await?;
    Ok(Json(DataResponse { data: vendors }))
}

/// GET /api/v1/vendors/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vendor>>> {
    let vendor = state.profiles().get_vendor(id).await?;
    Ok(Json(DataResponse { data: vendor }))
}

/// GET /api/v1/vendors/{id}/reviews
pub async fn reviews(
    State(state): State<AppState>,
    RequireAuth(_caller): RequireAuth,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<VendorReview>>>> {
    let reviews = state.progress().vendor_reviews(id).await?;
    Ok(Json(DataResponse { data: reviews }))
}
