//! Repository layer comprehensive testing
//!
//! Core CRUD lifecycle, payload validation, constraint classification, and
//! error-taxonomy guarantees against an in-memory SQLite database.

use anyhow::Result;
use serde_json::json;

use sea_guard::{ConstraintKind, RepositoryErrorKind, SecurityViolationKind, Severity};
use sea_guard::{Criteria, QueryOptions};

mod support;
use support::{connect, user_repository, users, wallet_repository};

#[tokio::test]
async fn test_create_update_query_delete_lifecycle() -> Result<()> {
    let connection = connect().await?;
    let repo = user_repository(connection);

    let created = repo
        .create(&json!({
            "email": "joao@x.com",
            "display_name": "João",
            "role": "admin"
        }))
        .await?;
    assert!(created.id > 0);
    assert_eq!(created.email.as_deref(), Some("joao@x.com"));
    assert!(created.is_active);

    let updated = repo
        .update(created.id, &json!({"display_name": "João Silva"}))
        .await?;
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.display_name.as_deref(), Some("João Silva"));
    // Untouched columns come back from the re-read, not a partial merge.
    assert_eq!(updated.email.as_deref(), Some("joao@x.com"));
    assert_eq!(updated.role.as_deref(), Some("admin"));

    let found: Option<users::Model> = repo
        .query_one(&Criteria::new().with("email", "joao@x.com"), None)
        .await?;
    assert_eq!(found.map(|u| u.id), Some(created.id));

    repo.delete(created.id).await?;

    let gone: Option<users::Model> = repo
        .query_one(&Criteria::new().with("id", created.id), None)
        .await?;
    assert!(gone.is_none());

    Ok(())
}

#[tokio::test]
async fn test_create_rejects_non_object_payload() -> Result<()> {
    let connection = connect().await?;
    let repo = user_repository(connection);

    for payload in [json!(null), json!("text"), json!(42), json!([1, 2])] {
        let err = repo.create(&payload).await.unwrap_err();
        assert!(
            matches!(err.kind(), RepositoryErrorKind::Validation { .. }),
            "payload {payload} should fail validation, got {err}"
        );
        assert_eq!(err.severity(), Severity::Medium);
        assert_eq!(err.operation(), "create");
    }

    Ok(())
}

#[tokio::test]
async fn test_create_empty_object_uses_store_defaults() -> Result<()> {
    let connection = connect().await?;
    let repo = user_repository(connection);

    let created = repo.create(&json!({})).await?;
    assert!(created.id > 0);
    assert!(created.email.is_none());
    assert!(created.is_active);

    Ok(())
}

#[tokio::test]
async fn test_update_with_id_key_is_unauthorized_access() -> Result<()> {
    let connection = connect().await?;
    let repo = user_repository(connection);

    let created = repo.create(&json!({"email": "victim@x.com"})).await?;

    let err = repo
        .update(created.id, &json!({"id": 999, "email": "attacker@x.com"}))
        .await
        .unwrap_err();
    match err.kind() {
        RepositoryErrorKind::SecurityViolation { violation, .. } => {
            assert_eq!(*violation, SecurityViolationKind::UnauthorizedAccess);
        }
        other => panic!("expected security violation, got {other}"),
    }
    assert_eq!(err.severity(), Severity::Critical);

    // The row is untouched.
    let found: Option<users::Model> = repo
        .query_one(&Criteria::new().with("id", created.id), None)
        .await?;
    assert_eq!(found.unwrap().email.as_deref(), Some("victim@x.com"));

    Ok(())
}

#[tokio::test]
async fn test_mutating_operations_report_missing_rows() -> Result<()> {
    let connection = connect().await?;
    let repo = user_repository(connection);

    let err = repo.update(999i64, &json!({"role": "ghost"})).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.severity(), Severity::Low);
    assert_eq!(err.operation(), "update");

    let err = repo.delete(999i64).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.severity(), Severity::Low);
    assert_eq!(err.operation(), "delete");

    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_is_unique_constraint_violation() -> Result<()> {
    let connection = connect().await?;
    let repo = user_repository(connection);

    repo.create(&json!({"email": "joao@x.com"})).await?;
    let err = repo.create(&json!({"email": "joao@x.com"})).await.unwrap_err();

    match err.kind() {
        RepositoryErrorKind::ConstraintViolation {
            constraint, detail, ..
        } => {
            assert_eq!(*constraint, ConstraintKind::Unique);
            assert!(
                detail.as_deref().unwrap_or_default().contains("email"),
                "detail should name the offending column: {detail:?}"
            );
        }
        other => panic!("expected constraint violation, got {other}"),
    }
    assert_eq!(err.severity(), Severity::High);
    assert_eq!(err.operation(), "create");

    Ok(())
}

#[tokio::test]
async fn test_dangling_wallet_is_foreign_key_violation() -> Result<()> {
    let connection = connect().await?;
    let repo = wallet_repository(connection);

    let err = repo
        .create(&json!({"user_id": 424242, "currency": "BRL"}))
        .await
        .unwrap_err();
    match err.kind() {
        RepositoryErrorKind::ConstraintViolation { constraint, .. } => {
            assert_eq!(*constraint, ConstraintKind::ForeignKey);
        }
        other => panic!("expected foreign-key violation, got {other}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_missing_required_column_is_not_null_violation() -> Result<()> {
    let connection = connect().await?;
    let users = user_repository(connection.clone());
    let wallets = wallet_repository(connection);

    let owner = users.create(&json!({"email": "owner@x.com"})).await?;
    let err = wallets
        .create(&json!({"user_id": owner.id}))
        .await
        .unwrap_err();
    match err.kind() {
        RepositoryErrorKind::ConstraintViolation {
            constraint, detail, ..
        } => {
            assert_eq!(*constraint, ConstraintKind::NotNull);
            assert!(detail.as_deref().unwrap_or_default().contains("currency"));
        }
        other => panic!("expected not-null violation, got {other}"),
    }

    Ok(())
}

#[tokio::test]
async fn test_query_one_requires_criteria_and_tolerates_misses() -> Result<()> {
    let connection = connect().await?;
    let repo = user_repository(connection);

    let err = repo
        .query_one::<users::Model>(&Criteria::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err.kind(), RepositoryErrorKind::Validation { .. }));

    // A miss on a read is Ok(None), never an error.
    let missing: Option<users::Model> = repo
        .query_one(&Criteria::new().with("email", "nobody@x.com"), None)
        .await?;
    assert!(missing.is_none());

    Ok(())
}

#[tokio::test]
async fn test_query_one_with_projection_and_relations() -> Result<()> {
    let connection = connect().await?;
    let users_repo = user_repository(connection.clone());
    let wallets_repo = wallet_repository(connection);

    let owner = users_repo.create(&json!({"email": "rich@x.com"})).await?;
    wallets_repo
        .create(&json!({"user_id": owner.id, "currency": "BRL", "balance": 10.5}))
        .await?;

    #[derive(Debug, sea_orm::FromQueryResult)]
    struct UserContact {
        id: i64,
        email: Option<String>,
    }

    let contact: Option<UserContact> = users_repo
        .query_one(
            &Criteria::new().with("id", owner.id),
            Some(
                &QueryOptions::new()
                    .relations(["wallets"])
                    .select(["id", "email"]),
            ),
        )
        .await?;
    let contact = contact.expect("row should match");
    assert_eq!(contact.id, owner.id);
    assert_eq!(contact.email.as_deref(), Some("rich@x.com"));

    Ok(())
}
