pub mod admin;
pub mod project;
pub mod request;
pub mod vendor;
