//! Domain rules for vendor matching and offer negotiation.
//!
//! Everything in this crate is pure: no I/O, no clocks, no storage. The
//! `db` crate persists the types defined here and the `api` crate wires
//! them into request handlers.

pub mod error;
pub mod geo;
pub mod negotiation;
pub mod progress;
pub mod project;
pub mod review;
pub mod roles;
pub mod types;
pub mod vendor_role;
pub mod window;
