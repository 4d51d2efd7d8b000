//! Shared request/response shapes for repository operations
//!
//! These are the only contracts exposed to calling services besides the
//! error taxonomy: equality criteria, query options, the pagination request,
//! and the pagination result.

use sea_orm::{Order, Value};
use serde::{Deserialize, Serialize};

/// AND-combined equality criteria: field name to required value.
///
/// Order is preserved so generated conditions are deterministic. Values are
/// sanitized at query-construction time; field names must resolve to real
/// entity columns or the operation fails closed.
#[derive(Debug, Clone, Default)]
pub struct Criteria {
    entries: Vec<(String, Value)>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one `field = value` condition.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.push((field.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Optional shaping of a query: extra filters, relation joins, projection.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub filters: Option<Criteria>,
    pub relations: Vec<String>,
    pub select: Vec<String>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filters(mut self, filters: Criteria) -> Self {
        self.filters = Some(filters);
        self
    }

    #[must_use]
    pub fn relations<I, S>(mut self, relations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.relations = relations.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }
}

/// Sort direction; the wire form matches SQL keywords.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl From<SortOrder> for Order {
    fn from(order: SortOrder) -> Self {
        match order {
            SortOrder::Asc => Order::Asc,
            SortOrder::Desc => Order::Desc,
        }
    }
}

/// Options for paginated queries.
///
/// Out-of-range values are clamped, never rejected: pagination is a UX
/// concern, not a security boundary. The sort field is a security boundary
/// and goes through whitelist validation instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number, 1-based
    pub page: Option<u64>,
    /// Items per page; clamped to the configured ceiling
    pub limit: Option<u64>,
    /// Sort column; must clear the sortable whitelist
    pub sort_by: Option<String>,
    /// Sort direction, `DESC` when unspecified
    pub sort_order: Option<SortOrder>,
}

/// One page of a larger result set, with enough metadata to compute further pages.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub has_next_page: bool,
    pub has_prev_page: bool,
    pub execution_time_ms: u64,
}

impl<T> PaginatedResult<T> {
    /// Derive page metadata from a fetched window and the overall count.
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64, execution_time_ms: u64) -> Self {
        let total_pages = if limit > 0 { total.div_ceil(limit) } else { 0 };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
            execution_time_ms,
        }
    }
}
