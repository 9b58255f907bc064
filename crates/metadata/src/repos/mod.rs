//! Repository traits for metadata operations.

pub mod aggregators;
pub mod assignments;
pub mod certificates;

pub use aggregators::AggregatorRepo;
pub use assignments::AssignmentRepo;
pub use certificates::CertificateRepo;
