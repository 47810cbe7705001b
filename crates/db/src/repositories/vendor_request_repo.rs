//! Repository for the `vendor_requests` ledger.
//!
//! Acceptance writes run inside a transaction holding an advisory lock on
//! the request's (project, role) slot, so two acceptances competing for the
//! same slot are serialized by PostgreSQL and the second one observes the
//! first booking.

use sqlx::{PgPool, Postgres, Transaction};
use vendorlink_core::negotiation::NegotiationState;
use vendorlink_core::progress::ProgressStep;
use vendorlink_core::types::DbId;

use crate::models::vendor_request::{NewVendorRequest, RequestQuery, VendorRequest};

const COLUMNS: &str = "id, user_id, vendor_id, project_id, role, description, \
                       longitude, latitude, start_at, end_at, vendor_status, user_status, \
                       budget, additional_details, progress, rating, rating_message, \
                       reviewed_at, created_at, updated_at";

/// Outcome of a conditional single-document update.
#[derive(Debug, Clone)]
pub enum GuardedUpdate {
    /// The write was applied; the updated row.
    Applied(VendorRequest),
    /// No request with that id exists.
    Missing,
    /// The request exists but the guard refused the write.
    Blocked,
}

/// Provides ledger operations for vendor requests.
pub struct VendorRequestRepo;

impl VendorRequestRepo {
    /// Insert a new request with both statuses Pending.
    pub async fn create(
        pool: &PgPool,
        input: &NewVendorRequest,
    ) -> Result<VendorRequest, sqlx::Error> {
        let query = format!(
            "INSERT INTO vendor_requests
                (user_id, vendor_id, project_id, role, description,
                 longitude, latitude, start_at, end_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, VendorRequest>(&query)
            .bind(input.user_id)
            .bind(input.vendor_id)
            .bind(input.project_id)
            .bind(input.role.as_str())
            .bind(&input.description)
            .bind(input.point.longitude)
            .bind(input.point.latitude)
            .bind(input.window.start)
            .bind(input.window.end)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<VendorRequest>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vendor_requests WHERE id = $1");
        sqlx::query_as::<_, VendorRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests matching `filter`, ordered by id.
    pub async fn list(
        pool: &PgPool,
        filter: &RequestQuery,
    ) -> Result<Vec<VendorRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM vendor_requests
             WHERE ($1::BIGINT IS NULL OR user_id = $1)
               AND ($2::BIGINT IS NULL OR project_id = $2)
               AND ($3::BIGINT IS NULL OR vendor_id = $3)
               AND ($4::TEXT IS NULL OR role = $4)
               AND ($5 = 'any'
                    OR ($5 = 'booked') = (vendor_status = $6 AND user_status = $6))
             ORDER BY id"
        );
        sqlx::query_as::<_, VendorRequest>(&query)
            .bind(filter.user_id)
            .bind(filter.project_id)
            .bind(filter.vendor_id)
            .bind(filter.role.map(|r| r.as_str()))
            .bind(filter.acceptance_param())
            .bind(NegotiationState::Accepted.id())
            .fetch_all(pool)
            .await
    }

    /// Record the vendor's acceptance with the optional negotiated terms.
    ///
    /// Refused when a sibling in the same slot is already booked. The terms
    /// are written only by the first acceptance; repeating it keeps them.
    pub async fn accept_as_vendor(
        pool: &PgPool,
        id: DbId,
        budget: Option<f64>,
        additional_details: Option<&str>,
    ) -> Result<GuardedUpdate, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if !Self::lock_slot_if_free(&mut tx, id).await? {
            return Self::classify_refusal(&mut tx, id).await;
        }

        let query = format!(
            "UPDATE vendor_requests SET
                vendor_status = $2,
                budget = CASE WHEN vendor_status = $2 THEN budget ELSE $3 END,
                additional_details = CASE WHEN vendor_status = $2
                                          THEN additional_details ELSE $4 END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, VendorRequest>(&query)
            .bind(id)
            .bind(NegotiationState::Accepted.id())
            .bind(budget)
            .bind(additional_details)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(GuardedUpdate::Applied(updated))
    }

    /// Record the user's acceptance.
    ///
    /// Refused when a sibling in the same slot is already booked.
    pub async fn accept_as_user(pool: &PgPool, id: DbId) -> Result<GuardedUpdate, sqlx::Error> {
        let mut tx = pool.begin().await?;
        if !Self::lock_slot_if_free(&mut tx, id).await? {
            return Self::classify_refusal(&mut tx, id).await;
        }

        let query = format!(
            "UPDATE vendor_requests SET user_status = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, VendorRequest>(&query)
            .bind(id)
            .bind(NegotiationState::Accepted.id())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(GuardedUpdate::Applied(updated))
    }

    /// Take the slot's advisory lock and report whether the slot is free
    /// for `id` (the request exists and no sibling is booked). The lock is
    /// keyed on the full 64-bit project id and held until `tx` ends.
    pub async fn lock_slot_if_free(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let slot: Option<(DbId, String)> =
            sqlx::query_as("SELECT project_id, role FROM vendor_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut **tx)
                .await?;
        let Some((project_id, role)) = slot else {
            return Ok(false);
        };

        sqlx::query(
            "SELECT pg_advisory_xact_lock(hashtextextended($1::BIGINT::TEXT || ':' || $2, 0))",
        )
        .bind(project_id)
        .bind(&role)
        .execute(&mut **tx)
        .await?;

        let booked_sibling: bool = sqlx::query_scalar(
            "SELECT EXISTS (
                SELECT 1 FROM vendor_requests s
                JOIN vendor_requests r ON r.id = $1
                WHERE s.user_id = r.user_id
                  AND s.project_id = r.project_id
                  AND s.role = r.role
                  AND s.id <> r.id
                  AND s.vendor_status = $2
                  AND s.user_status = $2
             )",
        )
        .bind(id)
        .bind(NegotiationState::Accepted.id())
        .fetch_one(&mut **tx)
        .await?;
        Ok(!booked_sibling)
    }

    async fn classify_refusal(
        tx: &mut Transaction<'_, Postgres>,
        id: DbId,
    ) -> Result<GuardedUpdate, sqlx::Error> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM vendor_requests WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut **tx)
                .await?;
        Ok(if exists {
            GuardedUpdate::Blocked
        } else {
            GuardedUpdate::Missing
        })
    }

    /// Write the initial checklist if the request is booked and has none yet.
    /// Returns `true` if this call populated it.
    pub async fn seed_progress(
        pool: &PgPool,
        id: DbId,
        steps: &[ProgressStep],
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE vendor_requests SET progress = $2, updated_at = NOW()
             WHERE id = $1
               AND vendor_status = $3 AND user_status = $3
               AND progress = '[]'::jsonb",
        )
        .bind(id)
        .bind(sqlx::types::Json(steps))
        .bind(NegotiationState::Accepted.id())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Set the `done` flag of the step named exactly `step` in one
    /// statement, so concurrent ticks on different steps never overwrite
    /// each other. Blocked when the request is not booked or has no such
    /// step.
    pub async fn set_progress_step(
        pool: &PgPool,
        id: DbId,
        step: &str,
        done: bool,
    ) -> Result<GuardedUpdate, sqlx::Error> {
        let query = format!(
            "UPDATE vendor_requests SET
                progress = (
                    SELECT jsonb_agg(
                        CASE WHEN elem->>'step' = $2
                             THEN jsonb_set(elem, '{{done}}', to_jsonb($3::BOOLEAN))
                             ELSE elem END
                        ORDER BY ord)
                    FROM jsonb_array_elements(progress) WITH ORDINALITY AS t(elem, ord)
                ),
                updated_at = NOW()
             WHERE id = $1
               AND vendor_status = $4 AND user_status = $4
               AND progress @> jsonb_build_array(jsonb_build_object('step', $2::TEXT))
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, VendorRequest>(&query)
            .bind(id)
            .bind(step)
            .bind(done)
            .bind(NegotiationState::Accepted.id())
            .fetch_optional(pool)
            .await?;
        Self::classify(pool, id, updated).await
    }

    /// Store a rating and message. Applied only to a booked request that
    /// carries no rating yet.
    pub async fn record_review(
        pool: &PgPool,
        id: DbId,
        rating: i16,
        message: &str,
    ) -> Result<GuardedUpdate, sqlx::Error> {
        let query = format!(
            "UPDATE vendor_requests SET
                rating = $2,
                rating_message = $3,
                reviewed_at = NOW(),
                updated_at = NOW()
             WHERE id = $1
               AND rating IS NULL
               AND vendor_status = $4 AND user_status = $4
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, VendorRequest>(&query)
            .bind(id)
            .bind(rating)
            .bind(message)
            .bind(NegotiationState::Accepted.id())
            .fetch_optional(pool)
            .await?;
        Self::classify(pool, id, updated).await
    }

    async fn classify(
        pool: &PgPool,
        id: DbId,
        updated: Option<VendorRequest>,
    ) -> Result<GuardedUpdate, sqlx::Error> {
        match updated {
            Some(row) => Ok(GuardedUpdate::Applied(row)),
            None => match Self::find_by_id(pool, id).await? {
                Some(_) => Ok(GuardedUpdate::Blocked),
                None => Ok(GuardedUpdate::Missing),
            },
        }
    }

    /// Every rating carried by the vendor's requests.
    pub async fn ratings_for_vendor(pool: &PgPool, vendor_id: DbId) -> Result<Vec<i16>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT rating FROM vendor_requests
             WHERE vendor_id = $1 AND rating IS NOT NULL
             ORDER BY id",
        )
        .bind(vendor_id)
        .fetch_all(pool)
        .await
    }

    /// Permanently delete a request. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vendor_requests WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
