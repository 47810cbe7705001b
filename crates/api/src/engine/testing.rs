//! Shared fixture for engine tests: one user with one project, three
//! caterers and a photographer near [`ORIGIN`], over the in-memory store.

use std::sync::Arc;

use chrono::TimeZone;
use vendorlink_core::geo::{GeoPoint, EARTH_RADIUS_KM};
use vendorlink_core::negotiation::VendorAction;
use vendorlink_core::roles::CallerRole;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::project::Project;
use vendorlink_db::models::user::CreateUser;
use vendorlink_db::models::vendor::CreateVendor;
use vendorlink_db::models::vendor_request::VendorRequest;
use vendorlink_db::store::memory::MemoryLedgerStore;
use vendorlink_db::store::LedgerStore;

use super::aggregator::ProjectAggregator;
use super::candidates::CandidateFilter;
use super::ledger::{RequestDraft, RequestLedger};
use super::negotiation::{NegotiationEngine, VendorResponse};
use super::profiles::Profiles;
use super::progress::ProgressTracker;
use super::reconcile::MirrorReconciler;
use super::Caller;
use crate::config::SearchConfig;

pub const ORIGIN: GeoPoint = GeoPoint {
    longitude: 77.5946,
    latitude: 12.9716,
};

pub fn north_of(origin: GeoPoint, km: f64) -> GeoPoint {
    GeoPoint {
        longitude: origin.longitude,
        latitude: origin.latitude + (km / EARTH_RADIUS_KM).to_degrees(),
    }
}

pub fn vendor_input(email: &str, role: VendorRole, location: GeoPoint) -> CreateVendor {
    CreateVendor {
        name: format!("{role} {email}"),
        email: email.to_string(),
        phone: "+91 98450 00000".to_string(),
        role,
        description: "Weddings and corporate events".to_string(),
        location,
        profile_image: None,
        work_images: Vec::new(),
    }
}

pub struct Fixture {
    pub store: Arc<MemoryLedgerStore>,
    pub user: Caller,
    pub project: Project,
    /// Nearest first.
    pub caterers: Vec<DbId>,
    pub photographer: DbId,
}

impl Fixture {
    pub async fn new() -> Self {
        let store = Arc::new(MemoryLedgerStore::new());
        let user = store
            .create_user(&CreateUser {
                name: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                phone: "+91 98450 11111".to_string(),
                profile_image: None,
            })
            .await
            .unwrap();
        let project = store.create_project(user.id, "Wedding").await.unwrap();

        let mut caterers = Vec::new();
        for (i, km) in [2.0, 5.0, 8.0].into_iter().enumerate() {
            let vendor = store
                .create_vendor(&vendor_input(
                    &format!("caterer{i}@example.com"),
                    VendorRole::Caterer,
                    north_of(ORIGIN, km),
                ))
                .await
                .unwrap();
            caterers.push(vendor.id);
        }
        let photographer = store
            .create_vendor(&vendor_input(
                "lens@example.com",
                VendorRole::Photographer,
                north_of(ORIGIN, 3.0),
            ))
            .await
            .unwrap()
            .id;

        Self {
            store,
            user: Caller::new(user.id, CallerRole::User),
            project,
            caterers,
            photographer,
        }
    }

    pub fn shared(&self) -> Arc<dyn LedgerStore> {
        self.store.clone()
    }

    pub fn ledger(&self) -> RequestLedger {
        RequestLedger::new(self.shared())
    }

    pub fn negotiation(&self) -> NegotiationEngine {
        NegotiationEngine::new(self.shared())
    }

    pub fn candidates(&self) -> CandidateFilter {
        CandidateFilter::new(self.shared(), SearchConfig::default())
    }

    pub fn progress(&self) -> ProgressTracker {
        ProgressTracker::new(self.shared())
    }

    pub fn projects(&self) -> ProjectAggregator {
        ProjectAggregator::new(self.shared())
    }

    pub fn profiles(&self) -> Profiles {
        Profiles::new(self.shared())
    }

    pub fn reconciler(&self) -> MirrorReconciler {
        MirrorReconciler::new(self.shared())
    }

    pub fn vendor(&self, id: DbId) -> Caller {
        Caller::new(id, CallerRole::Vendor)
    }

    pub fn admin(&self) -> Caller {
        Caller::new(0, CallerRole::Admin)
    }

    /// A second organizer with no projects.
    pub async fn other_user(&self) -> Caller {
        let user = self
            .store
            .create_user(&CreateUser {
                name: "Ravi".to_string(),
                email: "ravi@example.com".to_string(),
                phone: "+91 98450 22222".to_string(),
                profile_image: None,
            })
            .await
            .unwrap();
        Caller::new(user.id, CallerRole::User)
    }

    pub async fn add_vendor(&self, role: VendorRole, location: GeoPoint) -> DbId {
        let count = self.store.list_vendors_by_role(role).await.unwrap().len();
        self.store
            .create_vendor(&vendor_input(
                &format!("extra-{role}{count}@example.com"),
                role,
                location,
            ))
            .await
            .unwrap()
            .id
    }

    pub fn draft(&self, role: VendorRole) -> RequestDraft {
        self.draft_in(self.project.id, role)
    }

    fn draft_in(&self, project_id: DbId, role: VendorRole) -> RequestDraft {
        RequestDraft {
            project_id,
            role,
            location: ORIGIN,
            start_at: chrono::Utc.with_ymd_and_hms(2025, 6, 1, 17, 0, 0).unwrap(),
            end_at: chrono::Utc.with_ymd_and_hms(2025, 6, 1, 23, 0, 0).unwrap(),
            description: "Reception dinner for 120 guests".to_string(),
        }
    }

    /// Send a request to `vendor_id` for the vendor's own role.
    pub async fn send(&self, vendor_id: DbId) -> VendorRequest {
        self.send_in(self.project.id, vendor_id).await
    }

    /// Send, accept on both sides, and return the stored booked request.
    pub async fn book(&self, vendor_id: DbId) -> VendorRequest {
        let request = self.send(vendor_id).await;
        self.accept_both(request.id, vendor_id).await
    }

    pub async fn book_in_new_project(&self, vendor_id: DbId, name: &str) -> VendorRequest {
        let project = self.store.create_project(self.user.id, name).await.unwrap();
        let request = self.send_in(project.id, vendor_id).await;
        self.accept_both(request.id, vendor_id).await
    }

    async fn send_in(&self, project_id: DbId, vendor_id: DbId) -> VendorRequest {
        let role = self.store.find_vendor(vendor_id).await.unwrap().unwrap().role;
        self.ledger()
            .create(&self.user, vendor_id, &self.draft_in(project_id, role))
            .await
            .unwrap()
    }

    async fn accept_both(&self, request_id: DbId, vendor_id: DbId) -> VendorRequest {
        let engine = self.negotiation();
        engine
            .respond_as_vendor(
                &self.vendor(vendor_id),
                request_id,
                VendorResponse {
                    action: VendorAction::Accept,
                    budget: None,
                    additional_details: None,
                },
            )
            .await
            .unwrap();
        engine
            .respond_as_user(&self.user, request_id, true)
            .await
            .unwrap();
        self.store.find_request(request_id).await.unwrap().unwrap()
    }
}
