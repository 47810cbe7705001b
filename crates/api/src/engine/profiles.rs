//! User and vendor directory. Profiles carry no credentials; identity
//! comes from the token issuer.

use std::sync::Arc;

use vendorlink_core::error::CoreError;
use vendorlink_core::roles::Capability;
use vendorlink_core::types::DbId;
use vendorlink_core::vendor_role::VendorRole;
use vendorlink_db::models::user::{CreateUser, User};
use vendorlink_db::models::vendor::{CreateVendor, Vendor};
use vendorlink_db::store::LedgerStore;

use super::Caller;

#[derive(Clone)]
pub struct Profiles {
    store: Arc<dyn LedgerStore>,
}

impl Profiles {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn create_user(&self, caller: &Caller, input: &CreateUser) -> Result<User, CoreError> {
        caller.require(Capability::Administer)?;
        let user = self.store.create_user(input).await?;
        tracing::info!(user_id = user.id, "User profile created");
        Ok(user)
    }

    pub async fn create_vendor(
        &self,
        caller: &Caller,
        input: &CreateVendor,
    ) -> Result<Vendor, CoreError> {
        caller.require(Capability::Administer)?;
        input.location.validate()?;
        let vendor = self.store.create_vendor(input).await?;
        tracing::info!(vendor_id = vendor.id, role = %vendor.role, "Vendor profile created");
        Ok(vendor)
    }

    pub async fn get_vendor(&self, vendor_id: DbId) -> Result<Vendor, CoreError> {
        self.store
            .find_vendor(vendor_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Vendor",
                id: vendor_id,
            })
    }

    pub async fn vendors_by_role(&self, role: VendorRole) -> Result<Vec<Vendor>, CoreError> {
        Ok(self.store.list_vendors_by_role(role).await?)
    }
}
