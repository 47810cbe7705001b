//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the caller identity from a JWT Bearer token.
//! - [`rbac::RequireUser`] -- Requires the `ActAsUser` capability.
//! - [`rbac::RequireVendor`] -- Requires the `ActAsVendor` capability.
//! - [`rbac::RequireAdmin`] -- Requires the `Administer` capability.
//! - [`rbac::RequireAuth`] -- Requires any authenticated caller.

pub mod auth;
pub mod rbac;
