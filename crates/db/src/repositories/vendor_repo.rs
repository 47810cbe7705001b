//! Repository for the `vendors` table.

use sqlx::PgPool;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;

use crate::models::vendor::{CreateVendor, Vendor, VendorReview};

const COLUMNS: &str = "id, name, email, phone, role, description, longitude, latitude, \
                       profile_image, work_images, rating, created_at, updated_at";

/// Provides CRUD operations for vendor profiles.
pub struct VendorRepo;

impl VendorRepo {
    /// Insert a new vendor, returning the created row. Rating starts at 0.
    pub async fn create(pool: &PgPool, input: &CreateVendor) -> Result<Vendor, sqlx::Error> {
        let query = format!(
            "INSERT INTO vendors
                (name, email, phone, role, description, longitude, latitude,
                 profile_image, work_images)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Vendor>(&query)
            .bind(&input.name)
            .bind(&input.email)
            .bind(&input.phone)
            .bind(input.role.as_str())
            .bind(&input.description)
            .bind(input.location.longitude)
            .bind(input.location.latitude)
            .bind(&input.profile_image)
            .bind(&input.work_images)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Vendor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vendors WHERE id = $1");
        sqlx::query_as::<_, Vendor>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List every vendor practising `role`, ordered by id.
    pub async fn list_by_role(pool: &PgPool, role: VendorRole) -> Result<Vec<Vendor>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM vendors WHERE role = $1 ORDER BY id");
        sqlx::query_as::<_, Vendor>(&query)
            .bind(role.as_str())
            .fetch_all(pool)
            .await
    }

    /// Overwrite the aggregate rating. Returns `true` if the vendor exists.
    pub async fn set_rating(pool: &PgPool, id: DbId, rating: f64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE vendors SET rating = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(rating)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rating messages left on the vendor's requests, newest first.
    pub async fn list_reviews(pool: &PgPool, id: DbId) -> Result<Vec<VendorReview>, sqlx::Error> {
        sqlx::query_as::<_, VendorReview>(
            "SELECT id AS request_id, user_id, rating, rating_message AS message, reviewed_at
             FROM vendor_requests
             WHERE vendor_id = $1
               AND rating IS NOT NULL
               AND rating_message IS NOT NULL
               AND reviewed_at IS NOT NULL
             ORDER BY reviewed_at DESC",
        )
        .bind(id)
        .fetch_all(pool)
        .await
    }
}
