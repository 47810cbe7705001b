//! Caller roles and the capabilities they grant.
//!
//! Role names must match the `role` claim written into access tokens.
//! Authorization checks ask for a [`Capability`], never compare role
//! strings directly.

use crate::error::CoreError;

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const ROLE_VENDOR: &str = "vendor";

/// Something a caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Organize events: own projects, dispatch requests, accept offers.
    ActAsUser,
    /// Answer requests addressed to the caller.
    ActAsVendor,
    /// Maintenance operations and profile management.
    Administer,
}

/// The role asserted by the identity provider for a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallerRole {
    Admin,
    User,
    Vendor,
}

impl CallerRole {
    /// Parse a role claim. Unknown roles are rejected rather than
    /// defaulted so a malformed token cannot gain vendor rights.
    pub fn parse(role: &str) -> Result<Self, CoreError> {
        match role {
            ROLE_ADMIN => Ok(Self::Admin),
            ROLE_USER => Ok(Self::User),
            ROLE_VENDOR => Ok(Self::Vendor),
            other => Err(CoreError::Unauthorized(format!("Unknown role '{other}'"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => ROLE_ADMIN,
            Self::User => ROLE_USER,
            Self::Vendor => ROLE_VENDOR,
        }
    }

    /// The capability set granted by this role. Admin holds every capability.
    pub fn capabilities(self) -> &'static [Capability] {
        match self {
            Self::Admin => &[
                Capability::ActAsUser,
                Capability::ActAsVendor,
                Capability::Administer,
            ],
            Self::User => &[Capability::ActAsUser],
            Self::Vendor => &[Capability::ActAsVendor],
        }
    }

    pub fn has(self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl std::fmt::Display for CallerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fail with `Forbidden` unless `role` grants `capability`.
pub fn require(role: CallerRole, capability: Capability) -> Result<(), CoreError> {
    if role.has(capability) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Role '{role}' may not perform this action"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_holds_every_capability() {
        assert!(CallerRole::Admin.has(Capability::ActAsUser));
        assert!(CallerRole::Admin.has(Capability::ActAsVendor));
        assert!(CallerRole::Admin.has(Capability::Administer));
    }

    #[test]
    fn user_and_vendor_are_disjoint() {
        assert!(CallerRole::User.has(Capability::ActAsUser));
        assert!(!CallerRole::User.has(Capability::ActAsVendor));
        assert!(CallerRole::Vendor.has(Capability::ActAsVendor));
        assert!(!CallerRole::Vendor.has(Capability::ActAsUser));
        assert!(!CallerRole::Vendor.has(Capability::Administer));
    }

    #[test]
    fn parse_round_trips_known_roles() {
        for role in [CallerRole::Admin, CallerRole::User, CallerRole::Vendor] {
            assert_eq!(CallerRole::parse(role.as_str()).unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_unauthorized() {
        assert!(matches!(
            CallerRole::parse("caterer"),
            Err(CoreError::Unauthorized(_))
        ));
    }

    #[test]
    fn require_reports_forbidden() {
        assert!(require(CallerRole::User, Capability::ActAsUser).is_ok());
        assert!(matches!(
            require(CallerRole::User, Capability::Administer),
            Err(CoreError::Forbidden(_))
        ));
    }
}
