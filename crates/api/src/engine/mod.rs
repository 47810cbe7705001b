//! Vendor-matching and offer-negotiation engine.
//!
//! Each service is a thin handle over the shared [`LedgerStore`]; build
//! them per request from [`crate::state::AppState`].
//!
//! - [`ledger`] -- request lifecycle and its two mirrors.
//! - [`negotiation`] -- two-sided accept/reject with sibling retraction.
//! - [`candidates`] -- radius search over role-matching vendors.
//! - [`progress`] -- post-booking checklist and the single review.
//! - [`aggregator`] -- projects and role-level views.
//! - [`profiles`] -- user and vendor directory.
//! - [`reconcile`] -- mirror repair from the ledger.

use vendorlink_core::error::CoreError;
use vendorlink_core::roles::{self, CallerRole, Capability};
use vendorlink_core::types::DbId;
use vendorlink_db::models::project::Project;
use vendorlink_db::models::vendor_request::VendorRequest;
use vendorlink_db::store::LedgerStore;

pub mod aggregator;
pub mod candidates;
pub mod ledger;
pub mod negotiation;
pub mod profiles;
pub mod progress;
pub mod reconcile;

#[cfg(test)]
pub(crate) mod testing;

/// The identity an operation runs as, as asserted by the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub id: DbId,
    pub role: CallerRole,
}

impl Caller {
    pub fn new(id: DbId, role: CallerRole) -> Self {
        Self { id, role }
    }

    pub fn require(&self, capability: Capability) -> Result<(), CoreError> {
        roles::require(self.role, capability)
    }

    pub fn is_admin(&self) -> bool {
        self.role.has(Capability::Administer)
    }

    pub fn is_requesting_user(&self, request: &VendorRequest) -> bool {
        self.role == CallerRole::User && request.user_id == self.id
    }

    pub fn is_addressed_vendor(&self, request: &VendorRequest) -> bool {
        self.role == CallerRole::Vendor && request.vendor_id == self.id
    }

    /// Whether the caller is one of the two parties on `request`, or an admin.
    ///
    /// User and vendor ids live in separate id spaces, so the comparison
    /// is made against the side matching the caller's role.
    pub fn is_party_to(&self, request: &VendorRequest) -> bool {
        self.is_admin() || self.is_requesting_user(request) || self.is_addressed_vendor(request)
    }
}

/// Load `project_id` if it belongs to `user_id`. A project owned by someone
/// else is reported as absent.
pub(crate) async fn owned_project(
    store: &dyn LedgerStore,
    user_id: DbId,
    project_id: DbId,
) -> Result<Project, CoreError> {
    store
        .find_project(project_id)
        .await?
        .filter(|project| project.user_id == user_id)
        .ok_or(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        })
}
