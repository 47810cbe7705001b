//! Handlers for the `/projects` resource.

use std::collections::BTreeSet;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use validator::Validate;
use vendorlink_core::geo::GeoPoint;
use vendorlink_core::negotiation::AcceptanceFilter;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::project::{Project, ProjectWithRequests};
use vendorlink_db::models::vendor_request::VendorRequest;

use crate::engine::candidates::{Candidate, CandidateQuery};
use crate::engine::ledger::{BulkRemoval, RequestFilter};
use crate::error::AppResult;
use crate::middleware::rbac::RequireUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateProjectRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Query parameters for `GET /projects/{id}/requests`.
#[derive(Debug, Deserialize)]
pub struct RequestListParams {
    pub role: Option<String>,
    #[serde(default)]
    pub acceptance: AcceptanceFilter,
}

/// Query parameters for `GET /projects/{id}/candidates`.
#[derive(Debug, Deserialize, Validate)]
pub struct CandidateParams {
    pub role: String,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    pub radius_km: Option<f64>,
}

/// POST /api/v1/projects
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(input): Json<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<Project>>)> {
    input.validate()?;
    let project = state
        .projects()
        .create_project(&user.caller(), &input.name)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: project })))
}

/// GET /api/v1/projects
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> AppResult<Json<DataResponse<Vec<ProjectWithRequests>>>> {
    let projects = state.projects().list_projects(&user.caller()).await?;
    Ok(Json(DataResponse { data: projects }))
}

/// GET /api/v1/projects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectWithRequests>>> {
    let project = state.projects().get_project(&user.caller(), id).await?;
    Ok(Json(DataResponse { data: project }))
}

/// GET /api/v1/projects/{id}/requests
pub async fn list_requests(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<DbId>,
    Query(params): Query<RequestListParams>,
) -> AppResult<Json<DataResponse<Vec<VendorRequest>>>> {
    let filter = RequestFilter {
        role: params.role.as_deref().map(VendorRole::parse).transpose()?,
        acceptance: params.acceptance,
    };
    let requests = state
        .ledger()
        .list_by_user_project(&user.caller(), id, filter)
        .await?;
    Ok(Json(DataResponse { data: requests }))
}

/// GET /api/v1/projects/{id}/roles/ongoing
pub async fn ongoing_roles(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BTreeSet<VendorRole>>>> {
    let roles = state.projects().ongoing_roles(&user.caller(), id).await?;
    Ok(Json(DataResponse { data: roles }))
}

/// GET /api/v1/projects/{id}/roles/accepted
pub async fn accepted_roles(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<BTreeSet<VendorRole>>>> {
    let roles = state.projects().accepted_roles(&user.caller(), id).await?;
    Ok(Json(DataResponse { data: roles }))
}

/// DELETE /api/v1/projects/{id}/roles/{role}/pending
pub async fn purge_unaccepted(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path((id, role)): Path<(DbId, String)>,
) -> AppResult<Json<DataResponse<BulkRemoval>>> {
    let role = VendorRole::parse(&role)?;
    let outcome = state
        .projects()
        .purge_unaccepted(&user.caller(), id, role)
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}

/// GET /api/v1/projects/{id}/candidates
pub async fn candidates(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(id): Path<DbId>,
    Query(params): Query<CandidateParams>,
) -> AppResult<Json<DataResponse<Vec<Candidate>>>> {
    params.validate()?;
    let query = CandidateQuery {
        project_id: id,
        role: VendorRole::parse(&params.role)?,
        origin: GeoPoint {
            longitude: params.longitude,
            latitude: params.latitude,
        },
        radius_km: params.radius_km,
    };
    let found = state
        .candidates()
        .find_candidates(&user.caller(), &query)
        .await?;
    Ok(Json(DataResponse { data: found }))
}
