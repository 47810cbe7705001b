//! Geospatial Candidate Filter.
//!
//! Scans every vendor of the requested role and keeps those within the
//! search radius of the event, minus the vendors already targeted in the
//! caller's (project, role) slot. Results are nearest first, ties by id.

use std::sync::Arc;

use serde::Serialize;
use vendorlink_core::error::CoreError;
use vendorlink_core::geo::{validate_radius, within_radius, GeoPoint};
use vendorlink_core::roles::Capability;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::vendor::Vendor;
use vendorlink_db::store::LedgerStore;

use super::ledger::RequestLedger;
use super::{owned_project, Caller};
use crate::config::SearchConfig;

#[derive(Debug, Clone)]
pub struct CandidateQuery {
    pub project_id: DbId,
    pub role: VendorRole,
    pub origin: GeoPoint,
    /// Falls back to the configured default radius.
    pub radius_km: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Candidate {
    #[serde(flatten)]
    pub vendor: Vendor,
    pub distance_km: f64,
}

#[derive(Clone)]
pub struct CandidateFilter {
    store: Arc<dyn LedgerStore>,
    search: SearchConfig,
}

impl CandidateFilter {
    pub fn new(store: Arc<dyn LedgerStore>, search: SearchConfig) -> Self {
        Self { store, search }
    }

    pub async fn find_candidates(
        &self,
        caller: &Caller,
        query: &CandidateQuery,
    ) -> Result<Vec<Candidate>, CoreError> {
        caller.require(Capability::ActAsUser)?;
        query.origin.validate()?;
        let radius_km = query.radius_km.unwrap_or(self.search.default_radius_km);
        validate_radius(radius_km, self.search.max_radius_km)?;

        let project = owned_project(self.store.as_ref(), caller.id, query.project_id).await?;
        let targeted = RequestLedger::new(Arc::clone(&self.store))
            .targeted_vendors(caller.id, project.id, query.role)
            .await?;

        let vendors = self.store.list_vendors_by_role(query.role).await?;
        let scanned = vendors.len();
        let candidates: Vec<Candidate> = within_radius(
            query.origin,
            radius_km,
            vendors.into_iter().filter(|v| !targeted.contains(&v.id)),
            Vendor::point,
        )
        .into_iter()
        .map(|(vendor, distance_km)| Candidate {
            vendor,
            distance_km,
        })
        .collect();

        tracing::debug!(
            project_id = project.id,
            role = %query.role,
            radius_km,
            scanned,
            excluded = targeted.len(),
            found = candidates.len(),
            "Candidate search",
        );
        Ok(candidates)
    }
}
