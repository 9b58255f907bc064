//! Core domain types and shared logic for gridkeep.
//!
//! This crate defines the data model shared by the store, the managers and the
//! HTTP layer:
//! - Long-form device identifiers (LFDIs)
//! - Certificate assignment requests
//! - Paging windows
//! - Application configuration

pub mod certificate;
pub mod config;
pub mod error;
pub mod lfdi;
pub mod paging;

pub use certificate::{CertificateAssignmentRequest, CertificateSelector};
pub use error::{Error, Result};
pub use lfdi::Lfdi;
pub use paging::Paging;

/// Default number of records returned by a paged listing.
pub const DEFAULT_PAGE_LIMIT: u64 = 100;

/// Upper bound applied to any requested page size.
pub const MAX_PAGE_LIMIT: u64 = 500;
