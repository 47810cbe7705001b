//! Project model, its sent-request mirror entries, and DTOs.

use serde::Serialize;
use sqlx::FromRow;
use vendorlink_core::types::{DbId, Timestamp};
use vendorlink_core::vendor_role::VendorRole;

/// A row from the `projects` table. Projects belong to exactly one user.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Project {
    pub id: DbId,
    pub user_id: DbId,
    pub name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One entry of a project's sent-request mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromRow, Serialize)]
pub struct SentRequest {
    pub request_id: DbId,
    #[sqlx(try_from = "String")]
    pub role: VendorRole,
}

/// A project together with its mirror, for the "my projects" read path.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectWithRequests {
    #[serde(flatten)]
    pub project: Project,
    pub sent_requests: Vec<SentRequest>,
}

/// A sent-request mirror entry together with its owning project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, FromRow, Serialize)]
pub struct ProjectMirrorEntry {
    pub project_id: DbId,
    pub request_id: DbId,
    #[sqlx(try_from = "String")]
    pub role: VendorRole,
}
