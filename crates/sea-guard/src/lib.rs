//! sea-guard: whitelist-validated generic repository layer over SeaORM
//!
//! One implementation of create/update/delete/find/paginate shared by many
//! unrelated entity types, with two guarantees:
//!
//! - no caller-supplied string (sort field, filter key, relation name,
//!   selected column) reaches generated query text without clearing an
//!   explicit per-entity whitelist and a structural pattern;
//! - low-level database failures surface as a small, stable taxonomy of
//!   typed errors with severity classification instead of raw driver errors.
//!
//! Concrete repositories are thin adapters: they declare their whitelist and
//! relations once at construction and delegate everything else to
//! [`SecureRepository`].

pub mod config;
pub mod errors;
pub mod models;
pub mod query;
pub mod repository;
pub mod sanitize;
pub mod validation;

pub use config::RepositoryConfig;
pub use errors::{
    ConstraintKind, ConstraintMapper, DefaultConstraintMapper, RepositoryError,
    RepositoryErrorKind, RepositoryResult, SecurityViolationKind, Severity,
};
pub use models::{Criteria, PageRequest, PaginatedResult, QueryOptions, SortOrder};
pub use query::RelationRegistry;
pub use repository::{SecureRepository, SecureRepositoryBuilder};
pub use validation::FieldWhitelist;
