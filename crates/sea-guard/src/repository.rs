//! Generic repository façade
//!
//! [`SecureRepository`] is the one implementation of
//! create/update/delete/find/paginate shared by every entity type. Each
//! public operation runs validation and sanitization first and fails fast,
//! builds its query exclusively from validated fragments, and classifies
//! store failures through the error taxonomy exactly once. Already-typed
//! errors pass through unwrapped.
//!
//! A repository is stateless per call: it owns one shared connection pool
//! established at construction, never locks, never retries, and spawns no
//! background work. Dropping an operation's future cancels it.
//!
//! # Example
//!
//! ```rust,ignore
//! let users = SecureRepository::<users::Entity>::builder(connection)
//!     .entity_name("user")
//!     .whitelist(
//!         FieldWhitelist::new()
//!             .sortable(["id", "email", "created_at", "updated_at"])
//!             .selectable(["id", "email", "display_name"]),
//!     )
//!     .relation("wallets", || users::Relation::Wallets.def())
//!     .build();
//!
//! let created = users.create(&json!({"email": "joao@x.com"})).await?;
//! ```

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, IntoActiveModel, PaginatorTrait, QueryFilter, QuerySelect, RelationDef, Value,
};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::config::RepositoryConfig;
use crate::errors::classify::classify_db_err;
use crate::errors::{
    ConstraintMapper, DefaultConstraintMapper, RepositoryError, RepositoryResult,
    SecurityViolationKind,
};
use crate::models::{Criteria, PageRequest, PaginatedResult, QueryOptions};
use crate::query::{
    apply_equality, apply_relations, apply_select, apply_sort, clamp_page_window, resolve_column,
    RelationRegistry,
};
use crate::validation::{
    validate_relations, validate_select_fields, validate_sort_field, FieldWhitelist,
};

/// Whitelist-enforcing repository over one SeaORM entity.
#[derive(Clone)]
pub struct SecureRepository<E: EntityTrait> {
    connection: Arc<DatabaseConnection>,
    entity_name: String,
    whitelist: FieldWhitelist,
    relations: Arc<RelationRegistry>,
    constraint_mapper: Arc<dyn ConstraintMapper>,
    config: RepositoryConfig,
    _entity: PhantomData<E>,
}

/// Construction-time declaration of everything a repository may touch.
pub struct SecureRepositoryBuilder<E: EntityTrait> {
    connection: Arc<DatabaseConnection>,
    entity_name: String,
    whitelist: FieldWhitelist,
    relations: RelationRegistry,
    constraint_mapper: Arc<dyn ConstraintMapper>,
    config: RepositoryConfig,
    _entity: PhantomData<E>,
}

impl<E: EntityTrait> SecureRepositoryBuilder<E> {
    /// Human-readable entity name used in error messages; defaults to the table name.
    #[must_use]
    pub fn entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = name.into();
        self
    }

    #[must_use]
    pub fn whitelist(mut self, whitelist: FieldWhitelist) -> Self {
        self.whitelist = whitelist;
        self
    }

    /// Permit a relation path and register the join definition backing it.
    #[must_use]
    pub fn relation(
        mut self,
        name: impl Into<String>,
        def: impl Fn() -> RelationDef + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        self.whitelist.allow_relation(&name);
        self.relations.register(name, def);
        self
    }

    #[must_use]
    pub fn constraint_mapper(mut self, mapper: Arc<dyn ConstraintMapper>) -> Self {
        self.constraint_mapper = mapper;
        self
    }

    #[must_use]
    pub fn config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> SecureRepository<E> {
        SecureRepository {
            connection: self.connection,
            entity_name: self.entity_name,
            whitelist: self.whitelist,
            relations: Arc::new(self.relations),
            constraint_mapper: self.constraint_mapper,
            config: self.config,
            _entity: PhantomData,
        }
    }
}

impl<E: EntityTrait> SecureRepository<E> {
    pub fn builder(connection: Arc<DatabaseConnection>) -> SecureRepositoryBuilder<E> {
        SecureRepositoryBuilder {
            connection,
            entity_name: E::default().table_name().to_string(),
            whitelist: FieldWhitelist::default(),
            relations: RelationRegistry::new(),
            constraint_mapper: Arc::new(DefaultConstraintMapper),
            config: RepositoryConfig::default(),
            _entity: PhantomData,
        }
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn whitelist(&self) -> &FieldWhitelist {
        &self.whitelist
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Stamp the operation onto a fail-fast error; critical ones get audited.
    fn guard(&self, operation: &str, err: RepositoryError) -> RepositoryError {
        if err.is_security_violation() {
            warn!(
                entity = %self.entity_name,
                operation,
                severity = %err.severity(),
                "{err}"
            );
        }
        err.with_operation(operation)
    }

    /// Single classification boundary for store failures.
    fn classify(&self, operation: &str, err: DbErr) -> RepositoryError {
        classify_db_err(
            &self.entity_name,
            operation,
            err,
            self.constraint_mapper.as_ref(),
        )
    }
}

impl<E> SecureRepository<E>
where
    E: EntityTrait,
    E::Model: IntoActiveModel<E::ActiveModel> + DeserializeOwned + Send + Sync,
    E::ActiveModel: ActiveModelBehavior + Send,
{
    /// Persist a new entity and return the stored row, including generated
    /// identifier and store-computed defaults.
    pub async fn create(&self, data: &JsonValue) -> RepositoryResult<E::Model> {
        let operation = "create";

        if !data.is_object() {
            return Err(self.guard(
                operation,
                RepositoryError::validation(&self.entity_name, "create payload must be an object"),
            ));
        }

        let active = <E::ActiveModel as ActiveModelTrait>::from_json(data.clone())
            .map_err(|e| self.classify(operation, e))?;
        let model = active
            .insert(self.connection.as_ref())
            .await
            .map_err(|e| self.classify(operation, e))?;

        debug!(entity = %self.entity_name, "created");
        Ok(model)
    }

    /// Update by id and return the fresh row.
    ///
    /// The row is re-read after the write instead of merged in memory, so
    /// store-computed defaults and triggers are reflected. A payload that
    /// tries to relocate the row's identity is an attack signal, not a
    /// validation slip.
    pub async fn update(
        &self,
        id: impl Into<Value> + Send,
        data: &JsonValue,
    ) -> RepositoryResult<E::Model> {
        let operation = "update";

        let Some(payload) = data.as_object() else {
            return Err(self.guard(
                operation,
                RepositoryError::validation(&self.entity_name, "update payload must be an object"),
            ));
        };

        if payload.contains_key("id") {
            return Err(self.guard(
                operation,
                RepositoryError::security(
                    SecurityViolationKind::UnauthorizedAccess,
                    "attempt to overwrite the id field in an update payload",
                ),
            ));
        }

        let id_value: Value = id.into();
        let id_column = resolve_column::<E>(&self.entity_name, "id")
            .map_err(|e| self.guard(operation, e))?;

        let active = <E::ActiveModel as ActiveModelTrait>::from_json(data.clone())
            .map_err(|e| self.classify(operation, e))?;

        let result = E::update_many()
            .set(active)
            .filter(id_column.eq(id_value.clone()))
            .exec(self.connection.as_ref())
            .await
            .map_err(|e| self.classify(operation, e))?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(
                &self.entity_name,
                format!("id={id_value:?}"),
            )
            .with_operation(operation));
        }

        let fresh = E::find()
            .filter(id_column.eq(id_value.clone()))
            .one(self.connection.as_ref())
            .await
            .map_err(|e| self.classify(operation, e))?;

        fresh.ok_or_else(|| {
            RepositoryError::not_found(&self.entity_name, format!("id={id_value:?}"))
                .with_operation(operation)
        })
    }

    /// Delete by id; a miss is a failure for mutating operations.
    pub async fn delete(&self, id: impl Into<Value> + Send) -> RepositoryResult<()> {
        let operation = "delete";

        let id_value: Value = id.into();
        let id_column = resolve_column::<E>(&self.entity_name, "id")
            .map_err(|e| self.guard(operation, e))?;

        let result = E::delete_many()
            .filter(id_column.eq(id_value.clone()))
            .exec(self.connection.as_ref())
            .await
            .map_err(|e| self.classify(operation, e))?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::not_found(
                &self.entity_name,
                format!("id={id_value:?}"),
            )
            .with_operation(operation));
        }

        debug!(entity = %self.entity_name, "deleted");
        Ok(())
    }

    /// First row matching the criteria, or `None`.
    ///
    /// A miss here is not an error; only mutating operations treat "not
    /// found" as failure. `M` is the decode target: the full entity model,
    /// or a partial model matching a requested projection.
    pub async fn query_one<M>(
        &self,
        criteria: &Criteria,
        options: Option<&QueryOptions>,
    ) -> RepositoryResult<Option<M>>
    where
        M: FromQueryResult + Send + Sync,
    {
        let operation = "query_one";

        if criteria.is_empty() {
            return Err(self.guard(
                operation,
                RepositoryError::validation(&self.entity_name, "query criteria must not be empty"),
            ));
        }

        let mut select = apply_equality(
            E::find(),
            &self.entity_name,
            criteria,
            self.config.max_scalar_length,
        )
        .map_err(|e| self.guard(operation, e))?;

        if let Some(opts) = options {
            if let Some(filters) = &opts.filters {
                select = apply_equality(
                    select,
                    &self.entity_name,
                    filters,
                    self.config.max_scalar_length,
                )
                .map_err(|e| self.guard(operation, e))?;
            }

            let relations = validate_relations(
                &opts.relations,
                self.whitelist.relation_fields(),
                self.config.max_relations,
            )
            .map_err(|e| self.guard(operation, e))?;
            select = apply_relations(select, &relations, &self.relations);

            let fields = validate_select_fields(&opts.select, self.whitelist.selectable_fields())
                .map_err(|e| self.guard(operation, e))?;
            select = apply_select(select, &self.entity_name, &fields)
                .map_err(|e| self.guard(operation, e))?;
        }

        select
            .into_model::<M>()
            .one(self.connection.as_ref())
            .await
            .map_err(|e| self.classify(operation, e))
    }

    /// One page of rows matching the criteria and filters.
    ///
    /// Clauses compose in a strict order: criteria, filters, relations,
    /// projection, sort, window. The count and the fetch are two statements
    /// and are not snapshot-consistent under concurrent writers; `total` may
    /// lag `items` slightly, which is accepted.
    pub async fn query_paginated<M>(
        &self,
        pagination: &PageRequest,
        criteria: Option<&Criteria>,
        options: Option<&QueryOptions>,
    ) -> RepositoryResult<PaginatedResult<M>>
    where
        M: FromQueryResult + Send + Sync,
    {
        let operation = "query_paginated";
        let started = Instant::now();

        let window = clamp_page_window(pagination, &self.config);
        let sort_field = validate_sort_field(
            pagination.sort_by.as_deref().unwrap_or(""),
            self.whitelist.sortable_fields(),
        )
        .map_err(|e| self.guard(operation, e))?;
        let sort_order = pagination.sort_order.unwrap_or_default();

        let mut select = E::find();

        if let Some(criteria) = criteria {
            select = apply_equality(
                select,
                &self.entity_name,
                criteria,
                self.config.max_scalar_length,
            )
            .map_err(|e| self.guard(operation, e))?;
        }

        if let Some(opts) = options {
            if let Some(filters) = &opts.filters {
                select = apply_equality(
                    select,
                    &self.entity_name,
                    filters,
                    self.config.max_scalar_length,
                )
                .map_err(|e| self.guard(operation, e))?;
            }

            let relations = validate_relations(
                &opts.relations,
                self.whitelist.relation_fields(),
                self.config.max_relations,
            )
            .map_err(|e| self.guard(operation, e))?;
            select = apply_relations(select, &relations, &self.relations);
        }

        // Count sees the same conditions and joins but not the projection.
        let count_query = select.clone();

        if let Some(opts) = options {
            let fields = validate_select_fields(&opts.select, self.whitelist.selectable_fields())
                .map_err(|e| self.guard(operation, e))?;
            select = apply_select(select, &self.entity_name, &fields)
                .map_err(|e| self.guard(operation, e))?;
        }

        select = apply_sort(select, &self.entity_name, &sort_field, sort_order)
            .map_err(|e| self.guard(operation, e))?;
        select = select.offset(window.offset).limit(window.limit);

        let total = count_query
            .count(self.connection.as_ref())
            .await
            .map_err(|e| self.classify(operation, e))?;
        let items = select
            .into_model::<M>()
            .all(self.connection.as_ref())
            .await
            .map_err(|e| self.classify(operation, e))?;

        debug!(
            entity = %self.entity_name,
            total,
            page = window.page,
            limit = window.limit,
            "paginated query"
        );

        Ok(PaginatedResult::new(
            items,
            total,
            window.page,
            window.limit,
            started.elapsed().as_millis() as u64,
        ))
    }
}
