//! # Clinicore Shared Library
//!
//! This crate contains shared types, database models, and clinic business
//! logic used across the Clinicore API server and background worker.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Authentication and authorization utilities
//! - `db`: Connection pool and migration helpers
//! - `booking`: Appointment booking and lifecycle service
//! - `visibility`: Role-scoped query filtering
//! - `stock`: Inventory stock adjustment service
//! - `events`: Side-effect events and the outbox

pub mod auth;
pub mod booking;
pub mod db;
pub mod events;
pub mod models;
pub mod stock;
pub mod visibility;

/// Current version of the Clinicore shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
