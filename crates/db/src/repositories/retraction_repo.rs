//! Repository for the `retraction_intents` outbox.

use sqlx::PgPool;
use vendorlink_core::types::DbId;

/// Records and resolves owed sibling retractions.
pub struct RetractionRepo;

impl RetractionRepo {
    /// Record (or re-open) an intent for `request_id`.
    pub async fn record(pool: &PgPool, request_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO retraction_intents (request_id) VALUES ($1)
             ON CONFLICT (request_id) DO UPDATE SET processed_at = NULL",
        )
        .bind(request_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn mark_processed(pool: &PgPool, request_id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE retraction_intents SET processed_at = NOW()
             WHERE request_id = $1 AND processed_at IS NULL",
        )
        .bind(request_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Unprocessed intents, oldest first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT request_id FROM retraction_intents
             WHERE processed_at IS NULL
             ORDER BY created_at, request_id",
        )
        .fetch_all(pool)
        .await
    }
}
