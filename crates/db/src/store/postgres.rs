//! [`LedgerStore`] over PostgreSQL, delegating to the repositories.

use async_trait::async_trait;
use vendorlink_core::progress::ProgressStep;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;

use super::{GuardedUpdate, LedgerStore, StoreResult};
use crate::models::project::{Project, ProjectMirrorEntry, SentRequest};
use crate::models::user::{CreateUser, User};
use crate::models::vendor::{CreateVendor, Vendor, VendorReview};
use crate::models::vendor_request::{NewVendorRequest, RequestQuery, VendorRequest};
use crate::repositories::{
    MirrorRepo, ProjectRepo, RetractionRepo, UserRepo, VendorRepo, VendorRequestRepo,
};
use crate::DbPool;

/// Production store. Cheap to clone.
#[derive(Clone)]
pub struct PgLedgerStore {
    pool: DbPool,
}

impl PgLedgerStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(crate::health_check(&self.pool).await?)
    }

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn create_vendor(&self, input: &CreateVendor) -> StoreResult<Vendor> {
        Ok(VendorRepo::create(&self.pool, input).await?)
    }

    async fn find_vendor(&self, id: DbId) -> StoreResult<Option<Vendor>> {
        Ok(VendorRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_vendors_by_role(&self, role: VendorRole) -> StoreResult<Vec<Vendor>> {
        Ok(VendorRepo::list_by_role(&self.pool, role).await?)
    }

    async fn set_vendor_rating(&self, vendor_id: DbId, rating: f64) -> StoreResult<bool> {
        Ok(VendorRepo::set_rating(&self.pool, vendor_id, rating).await?)
    }

    async fn vendor_reviews(&self, vendor_id: DbId) -> StoreResult<Vec<VendorReview>> {
        Ok(VendorRepo::list_reviews(&self.pool, vendor_id).await?)
    }

    async fn create_project(&self, user_id: DbId, name: &str) -> StoreResult<Project> {
        Ok(ProjectRepo::create(&self.pool, user_id, name).await?)
    }

    async fn find_project(&self, id: DbId) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_project_by_name(
        &self,
        user_id: DbId,
        name: &str,
    ) -> StoreResult<Option<Project>> {
        Ok(ProjectRepo::find_by_name(&self.pool, user_id, name).await?)
    }

    async fn list_projects(&self, user_id: DbId) -> StoreResult<Vec<Project>> {
        Ok(ProjectRepo::list_by_user(&self.pool, user_id).await?)
    }

    async fn insert_request(&self, input: &NewVendorRequest) -> StoreResult<VendorRequest> {
        Ok(VendorRequestRepo::create(&self.pool, input).await?)
    }

    async fn find_request(&self, id: DbId) -> StoreResult<Option<VendorRequest>> {
        Ok(VendorRequestRepo::find_by_id(&self.pool, id).await?)
    }

    async fn list_requests(&self, query: &RequestQuery) -> StoreResult<Vec<VendorRequest>> {
        Ok(VendorRequestRepo::list(&self.pool, query).await?)
    }

    async fn accept_as_vendor(
        &self,
        id: DbId,
        budget: Option<f64>,
        additional_details: Option<&str>,
    ) -> StoreResult<GuardedUpdate> {
        Ok(VendorRequestRepo::accept_as_vendor(&self.pool, id, budget, additional_details).await?)
    }

    async fn accept_as_user(&self, id: DbId) -> StoreResult<GuardedUpdate> {
        Ok(VendorRequestRepo::accept_as_user(&self.pool, id).await?)
    }

    async fn seed_progress(&self, id: DbId, steps: &[ProgressStep]) -> StoreResult<bool> {
        Ok(VendorRequestRepo::seed_progress(&self.pool, id, steps).await?)
    }

    async fn set_progress_step(
        &self,
        id: DbId,
        step: &str,
        done: bool,
    ) -> StoreResult<GuardedUpdate> {
        Ok(VendorRequestRepo::set_progress_step(&self.pool, id, step, done).await?)
    }

    async fn record_review(
        &self,
        id: DbId,
        rating: i16,
        message: &str,
    ) -> StoreResult<GuardedUpdate> {
        Ok(VendorRequestRepo::record_review(&self.pool, id, rating, message).await?)
    }

    async fn vendor_ratings(&self, vendor_id: DbId) -> StoreResult<Vec<i16>> {
        Ok(VendorRequestRepo::ratings_for_vendor(&self.pool, vendor_id).await?)
    }

    async fn delete_request(&self, id: DbId) -> StoreResult<bool> {
        Ok(VendorRequestRepo::delete(&self.pool, id).await?)
    }

    async fn add_sent_request(
        &self,
        project_id: DbId,
        request_id: DbId,
        role: VendorRole,
    ) -> StoreResult<()> {
        Ok(MirrorRepo::add_sent_request(&self.pool, project_id, request_id, role).await?)
    }

    async fn remove_sent_request(&self, project_id: DbId, request_id: DbId) -> StoreResult<()> {
        Ok(MirrorRepo::remove_sent_request(&self.pool, project_id, request_id).await?)
    }

    async fn sent_requests(&self, project_id: DbId) -> StoreResult<Vec<SentRequest>> {
        Ok(MirrorRepo::sent_requests(&self.pool, project_id).await?)
    }

    async fn all_sent_requests(&self) -> StoreResult<Vec<ProjectMirrorEntry>> {
        Ok(MirrorRepo::all_sent_requests(&self.pool).await?)
    }

    async fn add_inbox_entry(&self, vendor_id: DbId, request_id: DbId) -> StoreResult<()> {
        Ok(MirrorRepo::add_inbox_entry(&self.pool, vendor_id, request_id).await?)
    }

    async fn remove_inbox_entry(&self, vendor_id: DbId, request_id: DbId) -> StoreResult<()> {
        Ok(MirrorRepo::remove_inbox_entry(&self.pool, vendor_id, request_id).await?)
    }

    async fn inbox(&self, vendor_id: DbId) -> StoreResult<Vec<DbId>> {
        Ok(MirrorRepo::inbox(&self.pool, vendor_id).await?)
    }

    async fn all_inbox_entries(&self) -> StoreResult<Vec<(DbId, DbId)>> {
        Ok(MirrorRepo::all_inbox_entries(&self.pool).await?)
    }

    async fn remove_request_from_mirrors(&self, request_id: DbId) -> StoreResult<u64> {
        Ok(MirrorRepo::remove_request_everywhere(&self.pool, request_id).await?)
    }

    async fn record_retraction_intent(&self, request_id: DbId) -> StoreResult<()> {
        Ok(RetractionRepo::record(&self.pool, request_id).await?)
    }

    async fn complete_retraction_intent(&self, request_id: DbId) -> StoreResult<()> {
        Ok(RetractionRepo::mark_processed(&self.pool, request_id).await?)
    }

    async fn pending_retraction_intents(&self) -> StoreResult<Vec<DbId>> {
        Ok(RetractionRepo::list_pending(&self.pool).await?)
    }
}
