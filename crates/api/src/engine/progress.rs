//! Progress & Review Tracker.

use std::sync::Arc;

use serde::Serialize;
use vendorlink_core::error::CoreError;
use vendorlink_core::progress::ProgressStep;
use vendorlink_core::review::{aggregate_rating, is_reviewed, validate_review};
use vendorlink_core::roles::Capability;
use vendorlink_core::types::DbId;
use vendorlink_db::models::vendor::VendorReview;
use vendorlink_db::models::vendor_request::VendorRequest;
use vendorlink_db::store::{GuardedUpdate, LedgerStore};

use super::ledger::RequestLedger;
use super::Caller;

#[derive(Debug, Clone, Serialize)]
pub struct ReviewOutcome {
    pub request: VendorRequest,
    /// The vendor's recomputed aggregate, absent if the recompute failed.
    pub vendor_rating: Option<f64>,
}

#[derive(Clone)]
pub struct ProgressTracker {
    store: Arc<dyn LedgerStore>,
    ledger: RequestLedger,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        let ledger = RequestLedger::new(Arc::clone(&store));
        Self { store, ledger }
    }

    /// The checklist, empty until the request is booked.
    pub async fn get_progress(
        &self,
        caller: &Caller,
        request_id: DbId,
    ) -> Result<Vec<ProgressStep>, CoreError> {
        Ok(self.ledger.get_for(caller, request_id).await?.progress)
    }

    /// Set the `done` flag of the step named exactly `step`. Unknown names,
    /// including any name on a request that is not booked yet, are
    /// `MissingKey`.
    pub async fn set_progress_step(
        &self,
        caller: &Caller,
        request_id: DbId,
        step: &str,
        done: bool,
    ) -> Result<Vec<ProgressStep>, CoreError> {
        self.ledger.get_for(caller, request_id).await?;

        let updated = match self.store.set_progress_step(request_id, step, done).await? {
            GuardedUpdate::Applied(request) => request,
            GuardedUpdate::Blocked => {
                return Err(CoreError::MissingKey {
                    entity: "Progress step",
                    key: step.to_string(),
                })
            }
            GuardedUpdate::Missing => {
                return Err(CoreError::NotFound {
                    entity: "VendorRequest",
                    id: request_id,
                })
            }
        };
        tracing::info!(request_id, step, done, "Progress step updated");
        Ok(updated.progress)
    }

    /// Store the single review of a booked request, then refresh the
    /// vendor's aggregate rating.
    pub async fn submit_review(
        &self,
        caller: &Caller,
        request_id: DbId,
        rating: i16,
        message: &str,
    ) -> Result<ReviewOutcome, CoreError> {
        caller.require(Capability::ActAsUser)?;
        validate_review(rating, message)?;
        let message = message.trim();

        let request = self.ledger.get(request_id).await?;
        if !caller.is_requesting_user(&request) {
            return Err(CoreError::Forbidden(
                "Only the requesting user may review this engagement".into(),
            ));
        }
        if !request.is_booked() {
            return Err(CoreError::Conflict(
                "Only a booked engagement can be reviewed".into(),
            ));
        }

        let request = match self.store.record_review(request_id, rating, message).await? {
            GuardedUpdate::Applied(request) => request,
            GuardedUpdate::Blocked => {
                return Err(CoreError::Conflict(
                    "This engagement has already been reviewed".into(),
                ))
            }
            GuardedUpdate::Missing => {
                return Err(CoreError::NotFound {
                    entity: "VendorRequest",
                    id: request_id,
                })
            }
        };
        tracing::info!(request_id, vendor_id = request.vendor_id, rating, "Review recorded");

        let vendor_rating = match self.refresh_vendor_rating(request.vendor_id).await {
            Ok(rating) => Some(rating),
            Err(e) => {
                tracing::error!(vendor_id = request.vendor_id, error = %e, "Failed to refresh vendor rating");
                None
            }
        };
        Ok(ReviewOutcome {
            request,
            vendor_rating,
        })
    }

    pub async fn review_status(&self, caller: &Caller, request_id: DbId) -> Result<bool, CoreError> {
        let request = self.ledger.get_for(caller, request_id).await?;
        Ok(is_reviewed(request.rating, request.rating_message.as_deref()))
    }

    /// Rating messages left on the vendor's engagements, newest first.
    pub async fn vendor_reviews(&self, vendor_id: DbId) -> Result<Vec<VendorReview>, CoreError> {
        self.store
            .find_vendor(vendor_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Vendor",
                id: vendor_id,
            })?;
        Ok(self.store.vendor_reviews(vendor_id).await?)
    }

    async fn refresh_vendor_rating(&self, vendor_id: DbId) -> Result<f64, CoreError> {
        let ratings = self.store.vendor_ratings(vendor_id).await?;
        let aggregate = aggregate_rating(&ratings);
        if !self.store.set_vendor_rating(vendor_id, aggregate).await? {
            tracing::warn!(vendor_id, "Rated vendor no longer exists");
        }
        Ok(aggregate)
    }
}
