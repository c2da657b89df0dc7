//! # SalonHub Shared Library
//!
//! Core of the SalonHub platform: storage partitions, the tenant-aware
//! model router, models, the appointment conflict checker and the services
//! built on them. The `salonhub-server` binary wires these together.
//!
//! ## Module Organization
//!
//! - `db`: Connection pools, partitions, model router, migrations
//! - `models`: Database models and their queries
//! - `scheduling`: Booking windows, availability, booking stores
//! - `capabilities`: Notification and payment traits
//! - `services`: Appointment, tenant-admin and billing services
//! - `error`: Service error taxonomy

pub mod capabilities;
pub mod db;
pub mod error;
pub mod models;
pub mod scheduling;
pub mod services;

/// Current version of the SalonHub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
