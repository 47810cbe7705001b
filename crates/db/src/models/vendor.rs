//! Vendor profile model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vendorlink_core::geo::GeoPoint;
use vendorlink_core::types::{DbId, Timestamp};
use vendorlink_core::vendor_role::VendorRole;

/// A row from the `vendors` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vendor {
    pub id: DbId,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[sqlx(try_from = "String")]
    pub role: VendorRole,
    pub description: String,
    pub longitude: f64,
    pub latitude: f64,
    pub profile_image: Option<String>,
    pub work_images: Vec<String>,
    /// Mean of all ratings left on this vendor's requests, one decimal.
    pub rating: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Vendor {
    pub fn point(&self) -> GeoPoint {
        GeoPoint {
            longitude: self.longitude,
            latitude: self.latitude,
        }
    }
}

/// DTO for creating a vendor profile.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateVendor {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub role: VendorRole,
    pub description: String,
    pub location: GeoPoint,
    pub profile_image: Option<String>,
    #[serde(default)]
    pub work_images: Vec<String>,
}

/// A rating message left on one of the vendor's requests.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VendorReview {
    pub request_id: DbId,
    pub user_id: DbId,
    pub rating: i16,
    pub message: String,
    pub reviewed_at: Timestamp,
}
