//! Classification of store-level failures into the error taxonomy
//!
//! SeaORM surfaces driver failures as [`DbErr`]. Exactly one classification
//! pass happens at the repository façade boundary: constraint rejections
//! become [`ConstraintKind`]-tagged errors, structural conversion failures
//! become validation errors, and everything else becomes an internal error
//! carrying the original cause.
//!
//! Constraint detection is a per-store concern: PostgreSQL reports SQLSTATE
//! codes and a `Key (a)=(b)` detail line, SQLite and MySQL report
//! differently-shaped messages. The [`ConstraintMapper`] trait is the seam
//! for swapping stores without touching the core.

use regex::Regex;
use sea_orm::{DbErr, SqlErr};
use std::sync::OnceLock;

use super::types::{ConstraintKind, RepositoryError};

/// Maps a store failure onto a constraint kind, if it is one.
///
/// Returning `None` means "not a constraint violation"; the caller then
/// falls through to the generic classification.
pub trait ConstraintMapper: Send + Sync {
    fn classify(&self, err: &DbErr) -> Option<(ConstraintKind, Option<String>)>;
}

/// Default mapper covering PostgreSQL, SQLite, and MySQL failure shapes.
///
/// Unique and foreign-key rejections come through SeaORM's [`SqlErr`]
/// (driver-level error kinds). Not-null and check rejections are not exposed
/// there, so those fall back to matching the formatted message, including the
/// PostgreSQL SQLSTATE codes 23502 and 23514.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultConstraintMapper;

impl ConstraintMapper for DefaultConstraintMapper {
    fn classify(&self, err: &DbErr) -> Option<(ConstraintKind, Option<String>)> {
        if let Some(sql_err) = err.sql_err() {
            match sql_err {
                SqlErr::UniqueConstraintViolation(message) => {
                    let detail = extract_violation_detail(&message);
                    return Some((ConstraintKind::Unique, detail));
                }
                SqlErr::ForeignKeyConstraintViolation(message) => {
                    return Some((ConstraintKind::ForeignKey, Some(message)));
                }
                _ => {}
            }
        }

        let message = err.to_string();
        let lowered = message.to_lowercase();

        if lowered.contains("23502")
            || lowered.contains("not null constraint failed")
            || lowered.contains("null value in column")
            || lowered.contains("cannot be null")
        {
            return Some((
                ConstraintKind::NotNull,
                extract_violation_detail(&message).or(Some(message)),
            ));
        }

        if lowered.contains("23514") || lowered.contains("check constraint") {
            return Some((ConstraintKind::Check, Some(message)));
        }

        None
    }
}

/// Pull the offending `key=value` pair out of a constraint message.
///
/// PostgreSQL: `Key (email)=(joao@x.com) already exists.` -> `email=joao@x.com`
/// SQLite: `UNIQUE constraint failed: users.email` -> `users.email`
fn extract_violation_detail(message: &str) -> Option<String> {
    static PG_KEY: OnceLock<Regex> = OnceLock::new();
    static SQLITE_TARGET: OnceLock<Regex> = OnceLock::new();

    let pg_key = PG_KEY
        .get_or_init(|| Regex::new(r"Key \(([^)]+)\)=\(([^)]+)\)").expect("valid detail pattern"));
    if let Some(caps) = pg_key.captures(message) {
        return Some(format!("{}={}", &caps[1], &caps[2]));
    }

    let sqlite_target = SQLITE_TARGET.get_or_init(|| {
        Regex::new(r"constraint failed: ([A-Za-z_][A-Za-z0-9_]*\.[A-Za-z_][A-Za-z0-9_]*)")
            .expect("valid target pattern")
    });
    sqlite_target
        .captures(message)
        .map(|caps| caps[1].to_string())
}

/// One-shot translation of a [`DbErr`] into the taxonomy.
pub(crate) fn classify_db_err(
    entity: &str,
    operation: &str,
    err: DbErr,
    mapper: &dyn ConstraintMapper,
) -> RepositoryError {
    if let Some((constraint, detail)) = mapper.classify(&err) {
        return RepositoryError::constraint(entity, constraint, detail)
            .with_operation(operation)
            .with_source(err);
    }

    match err {
        DbErr::RecordNotFound(detail) => {
            RepositoryError::not_found(entity, detail).with_operation(operation)
        }
        DbErr::Json(message) | DbErr::Type(message) => {
            RepositoryError::validation(entity, message).with_operation(operation)
        }
        other => RepositoryError::internal(operation, other.to_string()).with_source(other),
    }
}
