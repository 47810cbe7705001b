//! The vendor-request ledger entry and its query/insert DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vendorlink_core::geo::GeoPoint;
use vendorlink_core::negotiation::{AcceptanceFilter, NegotiationState, StatusPair};
use vendorlink_core::progress::ProgressStep;
use vendorlink_core::types::{DbId, Timestamp};
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_core::window::RequestWindow;

/// A row from the `vendor_requests` table: one user-to-vendor request for
/// a role within a project.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VendorRequest {
    pub id: DbId,
    pub user_id: DbId,
    pub vendor_id: DbId,
    pub project_id: DbId,
    #[sqlx(try_from = "String")]
    pub role: VendorRole,
    pub description: String,
    pub longitude: f64,
    pub latitude: f64,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    #[sqlx(try_from = "i16")]
    pub vendor_status: NegotiationState,
    #[sqlx(try_from = "i16")]
    pub user_status: NegotiationState,
    /// Set by the vendor on acceptance only.
    pub budget: Option<f64>,
    pub additional_details: Option<String>,
    #[sqlx(json)]
    pub progress: Vec<ProgressStep>,
    pub rating: Option<i16>,
    pub rating_message: Option<String>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl VendorRequest {
    pub fn statuses(&self) -> StatusPair {
        StatusPair::new(self.vendor_status, self.user_status)
    }

    /// Both parties have accepted.
    pub fn is_booked(&self) -> bool {
        self.statuses().is_doubly_accepted()
    }

    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            longitude: self.longitude,
            latitude: self.latitude,
        }
    }

    /// Whether `other` competes with this request for the same slot:
    /// same user, project and role, different request.
    pub fn is_sibling_of(&self, other: &VendorRequest) -> bool {
        self.id != other.id
            && self.user_id == other.user_id
            && self.project_id == other.project_id
            && self.role == other.role
    }
}

/// Validated input for inserting a ledger entry. Both statuses start Pending.
#[derive(Debug, Clone)]
pub struct NewVendorRequest {
    pub user_id: DbId,
    pub vendor_id: DbId,
    pub project_id: DbId,
    pub role: VendorRole,
    pub description: String,
    pub point: GeoPoint,
    pub window: RequestWindow,
}

/// Filter for ledger listings. `None` fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct RequestQuery {
    pub user_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub vendor_id: Option<DbId>,
    pub role: Option<VendorRole>,
    pub acceptance: AcceptanceFilter,
}

impl RequestQuery {
    /// All requests of one (user, project) pair.
    pub fn for_project(user_id: DbId, project_id: DbId) -> Self {
        Self {
            user_id: Some(user_id),
            project_id: Some(project_id),
            ..Self::default()
        }
    }

    /// All requests competing for one (user, project, role) slot.
    pub fn for_slot(user_id: DbId, project_id: DbId, role: VendorRole) -> Self {
        Self {
            role: Some(role),
            ..Self::for_project(user_id, project_id)
        }
    }

    pub fn with_acceptance(mut self, acceptance: AcceptanceFilter) -> Self {
        self.acceptance = acceptance;
        self
    }

    /// In-process evaluation, used by the in-memory store.
    pub fn matches(&self, request: &VendorRequest) -> bool {
        self.user_id.map_or(true, |id| id == request.user_id)
            && self.project_id.map_or(true, |id| id == request.project_id)
            && self.vendor_id.map_or(true, |id| id == request.vendor_id)
            && self.role.map_or(true, |role| role == request.role)
            && self.acceptance.matches(request.statuses())
    }

    /// Acceptance filter as the SQL parameter the repository expects.
    pub fn acceptance_param(&self) -> &'static str {
        match self.acceptance {
            AcceptanceFilter::Any => "any",
            AcceptanceFilter::Open => "open",
            AcceptanceFilter::Booked => "booked",
        }
    }
}
