//! Error type definitions for the repository layer
//!
//! Every failure surfaced by this crate is a [`RepositoryError`]: one
//! classification kind plus the operation that raised it, a creation
//! timestamp, and optionally the underlying store error. Severity is a total
//! function of the kind, so callers never have to guess how serious a
//! failure is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use std::fmt;
use thiserror::Error;

/// How serious a repository failure is, from routine misses to attack signals.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

/// Which database rule a rejected write ran into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

/// What category of attack or misuse a rejected input looked like.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SecurityViolationKind {
    SqlInjection,
    RateLimit,
    UnauthorizedAccess,
    DataBreach,
}

/// Flat classification of repository failures
///
/// The kinds are deliberately few and stable: they are the propagation
/// currency between the repository core and whatever boundary consumes it.
#[derive(Debug, Error)]
pub enum RepositoryErrorKind {
    /// A targeted update/delete/read affected zero rows
    #[error("{entity} not found: {detail}")]
    EntityNotFound { entity: String, detail: String },

    /// Structurally invalid input value or payload
    #[error("validation failed for {entity}: {message}")]
    Validation { entity: String, message: String },

    /// The store rejected a write due to a schema constraint
    #[error("{constraint} constraint violated on {entity}{}", detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default())]
    ConstraintViolation {
        entity: String,
        constraint: ConstraintKind,
        detail: Option<String>,
    },

    /// A dynamic identifier or payload failed security validation
    #[error("security violation detected: {violation}: {detail}")]
    SecurityViolation {
        violation: SecurityViolationKind,
        detail: String,
    },

    /// Any other store or unexpected failure
    #[error("repository failure: {message}")]
    Internal { message: String },
}

impl RepositoryErrorKind {
    /// Fixed severity for each kind
    pub fn severity(&self) -> Severity {
        match self {
            Self::EntityNotFound { .. } => Severity::Low,
            Self::Validation { .. } => Severity::Medium,
            Self::ConstraintViolation { .. } => Severity::High,
            Self::SecurityViolation { .. } => Severity::Critical,
            Self::Internal { .. } => Severity::Medium,
        }
    }
}

/// Repository error with operation context
///
/// Created once at the failure site and returned immediately; never mutated
/// afterwards. `operation` names the public façade operation that was running
/// (`create`, `update`, `delete`, `query_one`, `query_paginated`) or the
/// validation stage for errors raised before any operation dispatch.
#[derive(Debug)]
pub struct RepositoryError {
    kind: RepositoryErrorKind,
    operation: String,
    timestamp: DateTime<Utc>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (during {})", self.kind, self.operation)
    }
}

impl StdError for RepositoryError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

impl RepositoryError {
    fn new(kind: RepositoryErrorKind, operation: impl Into<String>) -> Self {
        Self {
            kind,
            operation: operation.into(),
            timestamp: Utc::now(),
            source: None,
        }
    }

    /// A targeted operation matched zero rows
    pub fn not_found(entity: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::new(
            RepositoryErrorKind::EntityNotFound {
                entity: entity.into(),
                detail: detail.into(),
            },
            "find",
        )
    }

    /// Structurally invalid input
    pub fn validation(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            RepositoryErrorKind::Validation {
                entity: entity.into(),
                message: message.into(),
            },
            "validation",
        )
    }

    /// Store-rejected write
    pub fn constraint(
        entity: impl Into<String>,
        constraint: ConstraintKind,
        detail: Option<String>,
    ) -> Self {
        Self::new(
            RepositoryErrorKind::ConstraintViolation {
                entity: entity.into(),
                constraint,
                detail,
            },
            "constraint",
        )
    }

    /// Rejected unsafe identifier or payload
    pub fn security(violation: SecurityViolationKind, detail: impl Into<String>) -> Self {
        Self::new(
            RepositoryErrorKind::SecurityViolation {
                violation,
                detail: detail.into(),
            },
            "security",
        )
    }

    /// Any other failure, with the operation that hit it
    pub fn internal(operation: impl Into<String>, message: impl Into<String>) -> Self {
        let operation = operation.into();
        Self::new(
            RepositoryErrorKind::Internal {
                message: message.into(),
            },
            operation,
        )
    }

    /// Stamp the public operation name; used once at the façade boundary.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = operation.into();
        self
    }

    /// Attach the underlying store error.
    #[must_use]
    pub fn with_source(mut self, source: impl StdError + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> &RepositoryErrorKind {
        &self.kind
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn severity(&self) -> Severity {
        self.kind.severity()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, RepositoryErrorKind::EntityNotFound { .. })
    }

    pub fn is_security_violation(&self) -> bool {
        matches!(self.kind, RepositoryErrorKind::SecurityViolation { .. })
    }
}
