//! Whitelist validation of dynamic query identifiers
//!
//! Identifiers that end up inside generated query text (sort columns,
//! selected columns, relation paths) can never be passed as bound parameters,
//! so they must clear an explicit allow-list plus a structural pattern before
//! query construction sees them. This is the single most important invariant
//! of the crate: values are sanitized, identifiers are whitelisted.
//!
//! All functions here are pure; the per-entity whitelist is declared once at
//! repository construction via [`FieldWhitelist`] and never changes.

use regex::Regex;
use std::sync::OnceLock;

use crate::errors::{RepositoryError, RepositoryResult, SecurityViolationKind};

/// Sort columns every entity is assumed to have when no whitelist is declared.
pub const DEFAULT_SORTABLE_FIELDS: [&str; 3] = ["id", "created_at", "updated_at"];

/// Upper bound on relation fan-out when the repository config does not say otherwise.
pub const DEFAULT_MAX_RELATIONS: usize = 5;

fn ident_pattern() -> &'static Regex {
    static IDENT: OnceLock<Regex> = OnceLock::new();
    IDENT.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid ident pattern"))
}

fn relation_pattern() -> &'static Regex {
    // Same identifier rule, plus at most one dot for nested relation paths.
    static RELATION: OnceLock<Regex> = OnceLock::new();
    RELATION.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)?$")
            .expect("valid relation pattern")
    })
}

/// Per-entity allow-lists for dynamic identifiers.
///
/// Declared once when a repository is built. Empty `selectable`/`relations`
/// lists mean "structural validation only"; an empty `sortable` list falls
/// back to [`DEFAULT_SORTABLE_FIELDS`].
#[derive(Debug, Clone, Default)]
pub struct FieldWhitelist {
    sortable: Vec<String>,
    selectable: Vec<String>,
    relations: Vec<String>,
}

impl FieldWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sortable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sortable = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn selectable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selectable = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn relations<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn sortable_fields(&self) -> &[String] {
        &self.sortable
    }

    pub fn selectable_fields(&self) -> &[String] {
        &self.selectable
    }

    pub fn relation_fields(&self) -> &[String] {
        &self.relations
    }

    pub(crate) fn allow_relation(&mut self, name: &str) {
        if !self.relations.iter().any(|r| r == name) {
            self.relations.push(name.to_string());
        }
    }
}

/// Validate a sort column against the whitelist.
///
/// An absent sort field is a normal default (`"id"`); a wrong one is an
/// attack signal and fails closed. The asymmetry is deliberate.
pub fn validate_sort_field(candidate: &str, whitelist: &[String]) -> RepositoryResult<String> {
    let clean = candidate.trim();
    if clean.is_empty() {
        return Ok("id".to_string());
    }

    let permitted = if whitelist.is_empty() {
        DEFAULT_SORTABLE_FIELDS.iter().any(|f| *f == clean)
    } else {
        whitelist.iter().any(|f| f == clean)
    };

    if !permitted {
        let allowed = if whitelist.is_empty() {
            DEFAULT_SORTABLE_FIELDS.join(", ")
        } else {
            whitelist.join(", ")
        };
        return Err(RepositoryError::security(
            SecurityViolationKind::SqlInjection,
            format!("sort field `{clean}` not permitted; allowed: {allowed}"),
        ));
    }

    Ok(clean.to_string())
}

/// Validate a select projection against the whitelist and identifier pattern.
///
/// Empty input means "select the whole entity". The whole call aborts on the
/// first bad field; best-effort filtering would let a probe discover which
/// names pass.
pub fn validate_select_fields(
    candidates: &[String],
    whitelist: &[String],
) -> RepositoryResult<Vec<String>> {
    let mut valid = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let clean = candidate.trim();

        if clean.is_empty() {
            return Err(RepositoryError::security(
                SecurityViolationKind::SqlInjection,
                "empty select field",
            ));
        }

        if !ident_pattern().is_match(clean) {
            return Err(RepositoryError::security(
                SecurityViolationKind::SqlInjection,
                format!("select field has invalid format: `{clean}`"),
            ));
        }

        if !whitelist.is_empty() && !whitelist.iter().any(|f| f == clean) {
            return Err(RepositoryError::security(
                SecurityViolationKind::SqlInjection,
                format!("select field `{clean}` not permitted"),
            ));
        }

        valid.push(clean.to_string());
    }

    Ok(valid)
}

/// Validate relation paths against the whitelist and relation pattern.
///
/// Input is capped to `max` entries regardless of how many were supplied;
/// extras are dropped, not rejected, as a defense against unbounded join
/// fan-out. Blank entries are skipped.
pub fn validate_relations(
    candidates: &[String],
    whitelist: &[String],
    max: usize,
) -> RepositoryResult<Vec<String>> {
    let mut valid = Vec::new();

    for candidate in candidates.iter().take(max) {
        let clean = candidate.trim();
        if clean.is_empty() {
            continue;
        }

        if !whitelist.is_empty() && !whitelist.iter().any(|r| r == clean) {
            return Err(RepositoryError::security(
                SecurityViolationKind::SqlInjection,
                format!("relation `{clean}` not permitted"),
            ));
        }

        if !relation_pattern().is_match(clean) {
            return Err(RepositoryError::security(
                SecurityViolationKind::SqlInjection,
                format!("relation has invalid format: `{clean}`"),
            ));
        }

        valid.push(clean.to_string());
    }

    Ok(valid)
}
