//! Repository for the denormalized read-path mirrors:
//! `project_sent_requests` and `vendor_inbox`.
//!
//! Writes have set semantics: adding an existing entry and removing an
//! absent one are both no-ops.

use sqlx::PgPool;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;

use crate::models::project::{ProjectMirrorEntry, SentRequest};

/// Provides mirror maintenance for projects and vendor inboxes.
pub struct MirrorRepo;

impl MirrorRepo {
    pub async fn add_sent_request(
        pool: &PgPool,
        project_id: DbId,
        request_id: DbId,
        role: VendorRole,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO project_sent_requests (project_id, request_id, role)
             VALUES ($1, $2, $3)
             ON CONFLICT (project_id, request_id) DO NOTHING",
        )
        .bind(project_id)
        .bind(request_id)
        .bind(role.as_str())
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn remove_sent_request(
        pool: &PgPool,
        project_id: DbId,
        request_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM project_sent_requests WHERE project_id = $1 AND request_id = $2")
            .bind(project_id)
            .bind(request_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Remove `request_id` from every project and inbox mirror, whoever
    /// owns the entry. Both deletes run in one transaction.
    pub async fn remove_request_everywhere(
        pool: &PgPool,
        request_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let sent = sqlx::query("DELETE FROM project_sent_requests WHERE request_id = $1")
            .bind(request_id)
            .execute(&mut *tx)
            .await?;
        let inbox = sqlx::query("DELETE FROM vendor_inbox WHERE request_id = $1")
            .bind(request_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(sent.rows_affected() + inbox.rows_affected())
    }

    /// The project's mirror, in insertion order.
    pub async fn sent_requests(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<SentRequest>, sqlx::Error> {
        sqlx::query_as::<_, SentRequest>(
            "SELECT request_id, role FROM project_sent_requests
             WHERE project_id = $1
             ORDER BY created_at, request_id",
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }

    /// Every project mirror entry across all projects.
    pub async fn all_sent_requests(pool: &PgPool) -> Result<Vec<ProjectMirrorEntry>, sqlx::Error> {
        sqlx::query_as::<_, ProjectMirrorEntry>(
            "SELECT project_id, request_id, role FROM project_sent_requests",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn add_inbox_entry(
        pool: &PgPool,
        vendor_id: DbId,
        request_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO vendor_inbox (vendor_id, request_id)
             VALUES ($1, $2)
             ON CONFLICT (vendor_id, request_id) DO NOTHING",
        )
        .bind(vendor_id)
        .bind(request_id)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn remove_inbox_entry(
        pool: &PgPool,
        vendor_id: DbId,
        request_id: DbId,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM vendor_inbox WHERE vendor_id = $1 AND request_id = $2")
            .bind(vendor_id)
            .bind(request_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Request ids in the vendor's inbox, in arrival order.
    pub async fn inbox(pool: &PgPool, vendor_id: DbId) -> Result<Vec<DbId>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT request_id FROM vendor_inbox
             WHERE vendor_id = $1
             ORDER BY created_at, request_id",
        )
        .bind(vendor_id)
        .fetch_all(pool)
        .await
    }

    /// Every inbox entry as `(vendor_id, request_id)`.
    pub async fn all_inbox_entries(pool: &PgPool) -> Result<Vec<(DbId, DbId)>, sqlx::Error> {
        sqlx::query_as("SELECT vendor_id, request_id FROM vendor_inbox")
            .fetch_all(pool)
            .await
    }
}
