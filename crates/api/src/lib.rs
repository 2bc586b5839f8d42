//! # Syncline API
//!
//! HTTP service layer - routes and main entry point.
//!
//! This crate contains:
//! - Axum routes (HTTP → sync engine bridge)
//! - Application context (dependency injection)
//! - Main entry point and setup
//!
//! ## Architecture
//! - Depends on `domain`, `core`, and `infra`
//! - Wires up the hexagonal architecture
//! - Exposes sync operations over HTTP

pub mod context;
pub mod routes;
pub mod utils;

pub use context::AppContext;
pub use routes::router;
