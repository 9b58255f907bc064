//! Administrative operations over aggregators and their certificates.
//!
//! The managers in this crate hold the business rules; they never open or
//! finish transactions themselves. Every operation takes the caller's
//! [`MetadataTx`](gridkeep_metadata::MetadataTx) and performs all reads and
//! writes through it, so the caller decides whether the unit of work is
//! committed or rolled back.

pub mod aggregator;
pub mod certificate;
pub mod error;
pub mod page;

pub use certificate::AssignmentSummary;
pub use error::{AdminError, AdminResult};
pub use page::{AggregatorPage, CertificatePage, Page};
