//! # SalonHub Server Library
//!
//! Process-level wiring for SalonHub: configuration, application state and
//! start-up.
//!
//! ## Modules
//!
//! - `app`: Application state holding the router and services
//! - `config`: Configuration management
//! - `telemetry`: Tracing subscriber set-up
//! - `bootstrap`: Connecting partitions and running migrations

pub mod app;
pub mod bootstrap;
pub mod config;
pub mod telemetry;
