//! Request Ledger: creation, lookup, listing and deletion of vendor
//! requests, keeping the project and inbox mirrors in step.
//!
//! The ledger row is written first and is authoritative. Mirror writes
//! follow as separate steps; a failed mirror write is logged and left for
//! [`super::reconcile`] rather than undoing the ledger write.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use serde::Serialize;
use vendorlink_core::error::CoreError;
use vendorlink_core::geo::GeoPoint;
use vendorlink_core::negotiation::AcceptanceFilter;
use vendorlink_core::roles::Capability;
use vendorlink_core::types::{DbId, Timestamp};
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_core::window::RequestWindow;
use vendorlink_db::models::vendor_request::{NewVendorRequest, RequestQuery, VendorRequest};
use vendorlink_db::store::LedgerStore;

use super::{owned_project, Caller};

/// Everything a dispatch shares across its target vendors.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub project_id: DbId,
    pub role: VendorRole,
    pub location: GeoPoint,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub description: String,
}

/// Listing filter for [`RequestLedger::list_by_user_project`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestFilter {
    pub role: Option<VendorRole>,
    pub acceptance: AcceptanceFilter,
}

/// Result of deleting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Removal {
    pub request_id: DbId,
    /// `false` when the ledger entry was already gone.
    pub removed: bool,
    /// `false` when a mirror cleanup failed and needs a retry.
    pub mirrors_synced: bool,
}

/// Result of deleting a set of requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkRemoval {
    pub deleted: usize,
    /// Requests whose deletion or mirror cleanup failed.
    pub failed: Vec<DbId>,
}

#[derive(Clone)]
pub struct RequestLedger {
    store: Arc<dyn LedgerStore>,
}

impl RequestLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Create one request from the caller to `vendor_id`.
    pub async fn create(
        &self,
        caller: &Caller,
        vendor_id: DbId,
        draft: &RequestDraft,
    ) -> Result<VendorRequest, CoreError> {
        self.dispatch(caller, &[vendor_id], draft)
            .await?
            .pop()
            .ok_or_else(|| CoreError::Internal("Dispatch created no request".into()))
    }

    /// Create one request per vendor id.
    ///
    /// Every input is checked before the first write: the window and
    /// location, the caller's user profile and project ownership, each
    /// vendor's existence and stored role, and that no vendor is already
    /// targeted in this (user, project, role) slot. Duplicate ids collapse.
    pub async fn dispatch(
        &self,
        caller: &Caller,
        vendor_ids: &[DbId],
        draft: &RequestDraft,
    ) -> Result<Vec<VendorRequest>, CoreError> {
        caller.require(Capability::ActAsUser)?;
        let window = RequestWindow::new(draft.start_at, draft.end_at)?;
        draft.location.validate()?;

        let mut seen = BTreeSet::new();
        let vendor_ids: Vec<DbId> = vendor_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if vendor_ids.is_empty() {
            return Err(CoreError::Validation(
                "At least one vendor id is required".into(),
            ));
        }

        self.store
            .find_user(caller.id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "User",
                id: caller.id,
            })?;
        let project = owned_project(self.store.as_ref(), caller.id, draft.project_id).await?;

        let targeted = self
            .targeted_vendors(caller.id, project.id, draft.role)
            .await?;

        for &vendor_id in &vendor_ids {
            let vendor = self
                .store
                .find_vendor(vendor_id)
                .await?
                .ok_or(CoreError::NotFound {
                    entity: "Vendor",
                    id: vendor_id,
                })?;
            if vendor.role != draft.role {
                return Err(CoreError::Conflict(format!(
                    "Vendor {vendor_id} is registered as {}, not {}",
                    vendor.role, draft.role
                )));
            }
            if targeted.contains(&vendor_id) {
                return Err(CoreError::Conflict(format!(
                    "Vendor {vendor_id} already has a {} request in this project",
                    draft.role
                )));
            }
        }

        let mut created = Vec::with_capacity(vendor_ids.len());
        for vendor_id in vendor_ids {
            let input = NewVendorRequest {
                user_id: caller.id,
                vendor_id,
                project_id: project.id,
                role: draft.role,
                description: draft.description.trim().to_string(),
                point: draft.location,
                window,
            };
            let request = self.store.insert_request(&input).await?;
            self.mirror_created(&request).await;
            tracing::info!(
                request_id = request.id,
                user_id = request.user_id,
                vendor_id = request.vendor_id,
                project_id = request.project_id,
                role = %request.role,
                "Vendor request created",
            );
            created.push(request);
        }
        Ok(created)
    }

    pub async fn get(&self, id: DbId) -> Result<VendorRequest, CoreError> {
        self.store
            .find_request(id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "VendorRequest",
                id,
            })
    }

    /// Fetch a request the caller is a party to.
    pub async fn get_for(&self, caller: &Caller, id: DbId) -> Result<VendorRequest, CoreError> {
        let request = self.get(id).await?;
        if !caller.is_party_to(&request) {
            return Err(CoreError::Forbidden(
                "Only the requesting user or the addressed vendor may view this request".into(),
            ));
        }
        Ok(request)
    }

    pub async fn list_by_user_project(
        &self,
        caller: &Caller,
        project_id: DbId,
        filter: RequestFilter,
    ) -> Result<Vec<VendorRequest>, CoreError> {
        caller.require(Capability::ActAsUser)?;
        owned_project(self.store.as_ref(), caller.id, project_id).await?;
        let query = RequestQuery {
            role: filter.role,
            ..RequestQuery::for_project(caller.id, project_id)
        }
        .with_acceptance(filter.acceptance);
        Ok(self.store.list_requests(&query).await?)
    }

    /// Every request the caller has sent, across projects.
    pub async fn sent_requests(&self, caller: &Caller) -> Result<Vec<VendorRequest>, CoreError> {
        caller.require(Capability::ActAsUser)?;
        let query = RequestQuery {
            user_id: Some(caller.id),
            ..RequestQuery::default()
        };
        Ok(self.store.list_requests(&query).await?)
    }

    /// The vendor's inbox, resolved through the inbox mirror. Entries whose
    /// ledger row is gone are skipped.
    pub async fn inbox(&self, caller: &Caller) -> Result<Vec<VendorRequest>, CoreError> {
        caller.require(Capability::ActAsVendor)?;
        let ids = self.store.inbox(caller.id).await?;
        let found = try_join_all(ids.iter().map(|id| self.store.find_request(*id))).await?;

        let mut requests = Vec::with_capacity(found.len());
        for (id, request) in ids.iter().zip(found) {
            match request {
                Some(request) if request.vendor_id == caller.id => requests.push(request),
                _ => tracing::debug!(vendor_id = caller.id, request_id = id, "Stale inbox entry"),
            }
        }
        Ok(requests)
    }

    /// Withdraw a request. Only its user (or an admin) may delete it.
    ///
    /// Deleting an id that is already gone is not an error: any mirror
    /// entries still pointing at it are swept.
    pub async fn delete(&self, caller: &Caller, id: DbId) -> Result<Removal, CoreError> {
        match self.store.find_request(id).await? {
            Some(request) => {
                if !caller.is_requesting_user(&request) && !caller.is_admin() {
                    return Err(CoreError::Forbidden(
                        "Only the requesting user may delete this request".into(),
                    ));
                }
                self.retract(&request).await
            }
            None => {
                let mirrors_synced = self.sweep_mirrors(id).await;
                Ok(Removal {
                    request_id: id,
                    removed: false,
                    mirrors_synced,
                })
            }
        }
    }

    /// Delete the ledger entry, then remove it from both mirrors.
    ///
    /// A ledger failure is returned as an error. Mirror failures are
    /// logged and reported through [`Removal::mirrors_synced`].
    pub async fn retract(&self, request: &VendorRequest) -> Result<Removal, CoreError> {
        let removed = self.store.delete_request(request.id).await?;
        let mirrors_synced = self
            .clear_mirrors(request.project_id, request.vendor_id, request.id)
            .await;
        tracing::info!(
            request_id = request.id,
            removed,
            mirrors_synced,
            "Vendor request retracted",
        );
        Ok(Removal {
            request_id: request.id,
            removed,
            mirrors_synced,
        })
    }

    /// Retract every request in `requests`. Order is irrelevant; the calls
    /// run concurrently and failures are collected, not propagated.
    pub async fn retract_all(&self, requests: &[VendorRequest]) -> BulkRemoval {
        let results = join_all(requests.iter().map(|r| self.retract(r))).await;

        let mut outcome = BulkRemoval::default();
        for (request, result) in requests.iter().zip(results) {
            match result {
                Ok(removal) => {
                    if removal.removed {
                        outcome.deleted += 1;
                    }
                    if !removal.mirrors_synced {
                        outcome.failed.push(request.id);
                    }
                }
                Err(e) => {
                    tracing::error!(request_id = request.id, error = %e, "Failed to retract request");
                    outcome.failed.push(request.id);
                }
            }
        }
        outcome
    }

    /// Vendors already targeted in the (user, project, role) slot.
    pub async fn targeted_vendors(
        &self,
        user_id: DbId,
        project_id: DbId,
        role: VendorRole,
    ) -> Result<BTreeSet<DbId>, CoreError> {
        let existing = self
            .store
            .list_requests(&RequestQuery::for_slot(user_id, project_id, role))
            .await?;
        Ok(existing.into_iter().map(|r| r.vendor_id).collect())
    }

    async fn mirror_created(&self, request: &VendorRequest) {
        let (sent, inbox) = tokio::join!(
            self.store
                .add_sent_request(request.project_id, request.id, request.role),
            self.store.add_inbox_entry(request.vendor_id, request.id),
        );
        if let Err(e) = sent {
            tracing::warn!(request_id = request.id, project_id = request.project_id, error = %e, "Project mirror write failed");
        }
        if let Err(e) = inbox {
            tracing::warn!(request_id = request.id, vendor_id = request.vendor_id, error = %e, "Inbox mirror write failed");
        }
    }

    async fn clear_mirrors(&self, project_id: DbId, vendor_id: DbId, request_id: DbId) -> bool {
        let (sent, inbox) = tokio::join!(
            self.store.remove_sent_request(project_id, request_id),
            self.store.remove_inbox_entry(vendor_id, request_id),
        );
        let mut synced = true;
        if let Err(e) = sent {
            tracing::warn!(request_id, project_id, error = %e, "Project mirror cleanup failed");
            synced = false;
        }
        if let Err(e) = inbox {
            tracing::warn!(request_id, vendor_id, error = %e, "Inbox mirror cleanup failed");
            synced = false;
        }
        synced
    }

    /// Remove `request_id` from every mirror that still lists it.
    async fn sweep_mirrors(&self, request_id: DbId) -> bool {
        match self.store.remove_request_from_mirrors(request_id).await {
            Ok(swept) => {
                if swept > 0 {
                    tracing::info!(request_id, swept, "Swept dangling mirror entries");
                }
                true
            }
            Err(e) => {
                tracing::warn!(request_id, error = %e, "Mirror sweep failed");
                false
            }
        }
    }
}
