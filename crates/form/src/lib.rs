//! Name/location form with debounced availability checks
//!
//! This crate provides:
//! - The `FormApi` collaborator contract and an in-process `MockApi`
//! - `NameForm`: name field, location selector, add/clear rules
//! - `RecordTable`: in-memory table of submitted records

pub mod api;
pub mod form;
pub mod records;

// Re-exports
pub use api::{ApiError, FormApi, MockApi, MockApiConfig};
pub use form::{FormError, FormSnapshot, NameForm, NameStatus};
pub use records::{Record, RecordTable};

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;
