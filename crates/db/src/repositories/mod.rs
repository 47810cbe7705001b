//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod mirror_repo;
pub mod project_repo;
pub mod retraction_repo;
pub mod user_repo;
pub mod vendor_repo;
pub mod vendor_request_repo;

pub use mirror_repo::MirrorRepo;
pub use project_repo::ProjectRepo;
pub use retraction_repo::RetractionRepo;
pub use user_repo::UserRepo;
pub use vendor_repo::VendorRepo;
pub use vendor_request_repo::{GuardedUpdate, VendorRequestRepo};
