//! The storage seam the negotiation engine runs against.
//!
//! [`LedgerStore`] models a document store with per-record atomic writes:
//! every method is one atomic step, and nothing spans methods. The ledger
//! (`vendor_requests`) is authoritative; the project and inbox mirrors are
//! separate writes that callers keep in step.
//!
//! - [`postgres::PgLedgerStore`] -- production implementation over the repositories.
//! - [`memory::MemoryLedgerStore`] -- in-process implementation for tests.

use async_trait::async_trait;
use vendorlink_core::error::CoreError;
use vendorlink_core::progress::ProgressStep;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;

use crate::models::project::{Project, ProjectMirrorEntry, SentRequest};
use crate::models::user::{CreateUser, User};
use crate::models::vendor::{CreateVendor, Vendor, VendorReview};
use crate::models::vendor_request::{NewVendorRequest, RequestQuery, VendorRequest};

pub use crate::repositories::GuardedUpdate;

pub mod memory;
pub mod postgres;

/// PostgreSQL unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("Duplicate value violates unique constraint: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// The store could not be reached or refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => CoreError::Conflict(format!(
                "Duplicate value violates unique constraint: {constraint}"
            )),
            other => CoreError::Upstream(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Reachability check used by the health endpoint.
    async fn ping(&self) -> StoreResult<()>;

    // -- Profiles ------------------------------------------------------------

    async fn create_user(&self, input: &CreateUser) -> StoreResult<User>;
    async fn find_user(&self, id: DbId) -> StoreResult<Option<User>>;
    async fn create_vendor(&self, input: &CreateVendor) -> StoreResult<Vendor>;
    async fn find_vendor(&self, id: DbId) -> StoreResult<Option<Vendor>>;
    /// Every vendor practising `role`, ordered by id.
    async fn list_vendors_by_role(&self, role: VendorRole) -> StoreResult<Vec<Vendor>>;
    /// Overwrite the aggregate rating. Returns `false` if the vendor is absent.
    async fn set_vendor_rating(&self, vendor_id: DbId, rating: f64) -> StoreResult<bool>;
    async fn vendor_reviews(&self, vendor_id: DbId) -> StoreResult<Vec<VendorReview>>;

    // -- Projects ------------------------------------------------------------

    /// Insert a project. A case-insensitive duplicate name for the same
    /// user fails with [`StoreError::Conflict`].
    async fn create_project(&self, user_id: DbId, name: &str) -> StoreResult<Project>;
    async fn find_project(&self, id: DbId) -> StoreResult<Option<Project>>;
    async fn find_project_by_name(&self, user_id: DbId, name: &str)
        -> StoreResult<Option<Project>>;
    async fn list_projects(&self, user_id: DbId) -> StoreResult<Vec<Project>>;

    // -- Ledger --------------------------------------------------------------

    async fn insert_request(&self, input: &NewVendorRequest) -> StoreResult<VendorRequest>;
    async fn find_request(&self, id: DbId) -> StoreResult<Option<VendorRequest>>;
    /// Requests matching `query`, ordered by id.
    async fn list_requests(&self, query: &RequestQuery) -> StoreResult<Vec<VendorRequest>>;
    /// Set vendorStatus = Accepted with the negotiated terms, unless a
    /// sibling in the same slot is already booked. Terms already recorded
    /// by an earlier acceptance are kept.
    async fn accept_as_vendor(
        &self,
        id: DbId,
        budget: Option<f64>,
        additional_details: Option<&str>,
    ) -> StoreResult<GuardedUpdate>;
    /// Set userStatus = Accepted, unless a sibling in the same slot is
    /// already booked.
    async fn accept_as_user(&self, id: DbId) -> StoreResult<GuardedUpdate>;
    /// Populate the checklist of a booked request whose checklist is empty.
    /// Returns `true` only for the call that populated it.
    async fn seed_progress(&self, id: DbId, steps: &[ProgressStep]) -> StoreResult<bool>;
    /// Set the `done` flag of one step of a booked request. Blocked when
    /// the request is not booked or has no step named exactly `step`.
    async fn set_progress_step(&self, id: DbId, step: &str, done: bool)
        -> StoreResult<GuardedUpdate>;
    /// Store a rating on a booked, not yet rated request.
    async fn record_review(&self, id: DbId, rating: i16, message: &str)
        -> StoreResult<GuardedUpdate>;
    /// Every rating carried by the vendor's requests.
    async fn vendor_ratings(&self, vendor_id: DbId) -> StoreResult<Vec<i16>>;
    /// Delete the ledger entry only. Returns `false` if it was already gone.
    async fn delete_request(&self, id: DbId) -> StoreResult<bool>;

    // -- Mirrors (set semantics) ---------------------------------------------

    async fn add_sent_request(
        &self,
        project_id: DbId,
        request_id: DbId,
        role: VendorRole,
    ) -> StoreResult<()>;
    async fn remove_sent_request(&self, project_id: DbId, request_id: DbId) -> StoreResult<()>;
    async fn sent_requests(&self, project_id: DbId) -> StoreResult<Vec<SentRequest>>;
    async fn all_sent_requests(&self) -> StoreResult<Vec<ProjectMirrorEntry>>;
    async fn add_inbox_entry(&self, vendor_id: DbId, request_id: DbId) -> StoreResult<()>;
    async fn remove_inbox_entry(&self, vendor_id: DbId, request_id: DbId) -> StoreResult<()>;
    async fn inbox(&self, vendor_id: DbId) -> StoreResult<Vec<DbId>>;
    /// Every inbox entry as `(vendor_id, request_id)`.
    async fn all_inbox_entries(&self) -> StoreResult<Vec<(DbId, DbId)>>;
    /// Remove `request_id` from every project mirror and inbox that lists
    /// it. Returns the number of entries removed.
    async fn remove_request_from_mirrors(&self, request_id: DbId) -> StoreResult<u64>;

    // -- Retraction outbox ---------------------------------------------------

    async fn record_retraction_intent(&self, request_id: DbId) -> StoreResult<()>;
    async fn complete_retraction_intent(&self, request_id: DbId) -> StoreResult<()>;
    async fn pending_retraction_intents(&self) -> StoreResult<Vec<DbId>>;
}
