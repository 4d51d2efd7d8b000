//! Safe construction of filter/join/projection/sort clauses
//!
//! Everything here operates on `sea_orm::Select<E>` and only ever sees
//! identifiers that already cleared validation plus values that already
//! cleared sanitization. Field names are resolved to the entity's `Column`
//! enum before use, so an unknown name can never be interpolated into query
//! text; values travel through the binder exclusively, which also makes the
//! parameter namespaces of criteria and filters collision-free by
//! construction.

use sea_orm::sea_query::Alias;
use sea_orm::{
    ColumnTrait, EntityTrait, IdenStatic, Iterable, JoinType, QueryFilter, QueryOrder,
    QuerySelect, RelationDef, Select,
};
use std::fmt;
use tracing::warn;

use crate::config::RepositoryConfig;
use crate::errors::{RepositoryError, RepositoryResult, SecurityViolationKind};
use crate::models::{Criteria, PageRequest, SortOrder};
use crate::sanitize::sanitize_value;

/// Join definitions registered at repository construction.
///
/// The registry is the statically inspectable replacement for runtime
/// relation metadata: each permitted relation path maps to a producer of the
/// `RelationDef` used for its left join.
#[derive(Default)]
pub struct RelationRegistry {
    entries: Vec<(String, Box<dyn Fn() -> RelationDef + Send + Sync>)>,
}

impl RelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        def: impl Fn() -> RelationDef + Send + Sync + 'static,
    ) {
        self.entries.push((name.into(), Box::new(def)));
    }

    pub fn resolve(&self, name: &str) -> Option<RelationDef> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, def)| def())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for RelationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Resolve a validated field name to the entity's column enum.
///
/// Defense in depth behind the whitelist: a name that is not a column of `E`
/// cannot reach generated SQL at all.
pub(crate) fn resolve_column<E: EntityTrait>(
    entity_name: &str,
    field: &str,
) -> RepositoryResult<E::Column> {
    E::Column::iter()
        .find(|column| column.as_str() == field)
        .ok_or_else(|| {
            RepositoryError::security(
                SecurityViolationKind::SqlInjection,
                format!("unknown column `{field}` on {entity_name}"),
            )
        })
}

/// AND one equality condition per `(field, value)` pair onto the query.
///
/// Used for both primary criteria and secondary filters; SeaORM's binder
/// assigns placeholders positionally, so the two call sites can never
/// collide even when they touch the same field.
pub(crate) fn apply_equality<E: EntityTrait>(
    mut select: Select<E>,
    entity_name: &str,
    criteria: &Criteria,
    max_scalar_length: usize,
) -> RepositoryResult<Select<E>> {
    for (field, value) in criteria.iter() {
        let name = field.trim();
        if name.is_empty() {
            continue;
        }
        let column = resolve_column::<E>(entity_name, name)?;
        let value = sanitize_value(entity_name, value.clone(), max_scalar_length)?;
        select = select.filter(column.eq(value));
    }
    Ok(select)
}

/// Left-join each validated relation path under a collision-safe alias.
///
/// A name that cleared structural validation but has no registered join
/// definition cannot be joined; it is skipped loudly rather than silently
/// changing result semantics. A to-many join repeats the parent row once per
/// child, so once anything is joined the query goes distinct: results and
/// counts are per parent entity, not per joined row.
pub(crate) fn apply_relations<E: EntityTrait>(
    mut select: Select<E>,
    validated: &[String],
    registry: &RelationRegistry,
) -> Select<E> {
    let mut joined = false;
    for name in validated {
        match registry.resolve(name) {
            Some(def) => {
                let alias = name.replace('.', "_");
                select = select.join_as(JoinType::LeftJoin, def, Alias::new(alias));
                joined = true;
            }
            None => {
                warn!(relation = %name, "relation has no registered join definition, skipping");
            }
        }
    }
    if joined {
        select = select.distinct();
    }
    select
}

/// Narrow the projection to the validated fields; empty means whole entity.
pub(crate) fn apply_select<E: EntityTrait>(
    select: Select<E>,
    entity_name: &str,
    validated: &[String],
) -> RepositoryResult<Select<E>> {
    if validated.is_empty() {
        return Ok(select);
    }
    let mut columns = Vec::with_capacity(validated.len());
    for field in validated {
        columns.push(resolve_column::<E>(entity_name, field)?);
    }
    Ok(select.select_only().columns(columns))
}

/// Order by exactly one validated column.
pub(crate) fn apply_sort<E: EntityTrait>(
    select: Select<E>,
    entity_name: &str,
    field: &str,
    order: SortOrder,
) -> RepositoryResult<Select<E>> {
    let column = resolve_column::<E>(entity_name, field)?;
    Ok(select.order_by(column, order.into()))
}

/// Clamped pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Clamp page and limit into range rather than rejecting them.
pub(crate) fn clamp_page_window(request: &PageRequest, config: &RepositoryConfig) -> PageWindow {
    let page = request.page.unwrap_or(1).max(1);
    let ceiling = config.max_page_size.max(1);
    let limit = request
        .limit
        .unwrap_or(config.default_page_size)
        .clamp(1, ceiling);
    PageWindow {
        page,
        limit,
        // Saturate: pagination stays total for any u64 the caller sends.
        offset: page.saturating_sub(1).saturating_mul(limit),
    }
}
