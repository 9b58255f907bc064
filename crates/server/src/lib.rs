//! HTTP admin API for gridkeep.
//!
//! This crate provides the HTTP surface over the aggregator and certificate
//! managers:
//! - Aggregator listing and lookup
//! - Per-aggregator certificate listing, batch assignment and unassignment
//! - Certificate catalogue
//! - Health and Prometheus metrics endpoints

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
