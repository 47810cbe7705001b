//! Event-organizer profile model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vendorlink_core::types::{DbId, Timestamp};

/// A row from the `users` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Already-hosted image URL supplied by the upload service.
    pub profile_image: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub profile_image: Option<String>,
}
