//! Shared test fixtures: in-memory database plus two entity adapters
//!
//! Mirrors a typical consumer of the crate: each concrete repository
//! declares its whitelist and relations once and delegates everything else.
#![allow(dead_code)]

use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, RelationTrait};
use std::sync::Arc;

use sea_guard::{FieldWhitelist, SecureRepository};

pub mod users {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    fn default_true() -> bool {
        true
    }

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "users")]
    pub struct Model {
        #[sea_orm(primary_key)]
        #[serde(default)]
        pub id: i64,
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub display_name: Option<String>,
        #[serde(default)]
        pub role: Option<String>,
        #[serde(default = "default_true")]
        pub is_active: bool,
        #[serde(default = "chrono::Utc::now")]
        pub created_at: DateTimeUtc,
        #[serde(default = "chrono::Utc::now")]
        pub updated_at: DateTimeUtc,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::wallets::Entity")]
        Wallets,
    }

    impl Related<super::wallets::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Wallets.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod wallets {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "wallets")]
    pub struct Model {
        #[sea_orm(primary_key)]
        #[serde(default)]
        pub id: i64,
        #[serde(default)]
        pub user_id: i64,
        #[serde(default)]
        pub currency: String,
        #[serde(default)]
        pub balance: f64,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::users::Entity",
            from = "Column::UserId",
            to = "super::users::Column::Id"
        )]
        User,
    }

    impl Related<super::users::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::User.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}
}

const SCHEMA: &[&str] = &[
    "PRAGMA foreign_keys = ON",
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        email TEXT UNIQUE,
        display_name TEXT,
        role TEXT,
        is_active INTEGER NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL DEFAULT (datetime('now')),
        updated_at TEXT NOT NULL DEFAULT (datetime('now'))
    )",
    "CREATE TABLE wallets (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        currency TEXT NOT NULL,
        balance REAL NOT NULL DEFAULT 0
    )",
];

/// In-memory SQLite with the test schema applied.
///
/// A single pooled connection keeps every statement on the same in-memory
/// database and keeps the foreign-keys pragma in effect.
pub async fn connect() -> Result<Arc<DatabaseConnection>> {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1);
    let connection = Database::connect(options).await?;
    for statement in SCHEMA {
        connection.execute_unprepared(statement).await?;
    }
    Ok(Arc::new(connection))
}

pub fn user_repository(connection: Arc<DatabaseConnection>) -> SecureRepository<users::Entity> {
    SecureRepository::<users::Entity>::builder(connection)
        .entity_name("user")
        .whitelist(
            FieldWhitelist::new()
                .sortable(["id", "email", "created_at", "updated_at"])
                .selectable(["id", "email", "display_name", "role"]),
        )
        .relation("wallets", || users::Relation::Wallets.def())
        .build()
}

pub fn wallet_repository(connection: Arc<DatabaseConnection>) -> SecureRepository<wallets::Entity> {
    SecureRepository::<wallets::Entity>::builder(connection)
        .entity_name("wallet")
        .whitelist(
            FieldWhitelist::new()
                .sortable(["id", "currency"])
                .selectable(["id", "user_id", "currency", "balance"]),
        )
        .relation("user", || wallets::Relation::User.def())
        .build()
}
