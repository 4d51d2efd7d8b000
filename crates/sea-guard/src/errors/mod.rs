//! Centralized error handling for the repository layer
//!
//! This module provides the error taxonomy every public repository operation
//! reports through: a small, stable set of kinds with fixed severities, rich
//! enough for a transport boundary to map deterministically onto response
//! classes (not-found, bad-request/forbidden, conflict, internal).
//!
//! # Error Kinds
//!
//! - **EntityNotFound**: a targeted update/delete/read matched zero rows
//! - **Validation**: structurally invalid input (non-object payload, non-finite number)
//! - **ConstraintViolation**: the store rejected a write (unique/foreign-key/not-null/check)
//! - **SecurityViolation**: a dynamic identifier failed whitelist or pattern validation
//! - **Internal**: any other store or unexpected failure
//!
//! # Usage
//!
//! ```rust
//! use sea_guard::errors::{RepositoryError, RepositoryResult, Severity};
//!
//! fn example() -> RepositoryResult<()> {
//!     let err = RepositoryError::not_found("user", "id=42");
//!     assert_eq!(err.severity(), Severity::Low);
//!     Err(err)
//! }
//! ```

pub mod classify;
pub mod types;

pub use classify::{ConstraintMapper, DefaultConstraintMapper};
pub use types::*;

/// Convenience type alias for Results using RepositoryError
pub type RepositoryResult<T> = Result<T, RepositoryError>;
