//! HTTP request handlers.

pub mod aggregators;
pub mod certificates;
pub mod common;
pub mod health;

pub use aggregators::*;
pub use certificates::*;
pub use health::*;
