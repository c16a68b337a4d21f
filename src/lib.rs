pub mod analyzer;
pub mod error;
pub mod formatters;
pub mod registry;
pub mod snapshot;
pub mod types;

pub use error::{AuditError, Result};
