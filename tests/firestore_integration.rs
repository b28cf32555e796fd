// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore integration tests.
//!
//! These tests require the Firestore emulator to be running
//! (FIRESTORE_EMULATOR_HOST set); they are skipped otherwise.

use curriculum_auth::db::{FirestoreDb, UserStore};
use curriculum_auth::models::{Role, SubscriptionStatus};

mod common;
use common::{test_db, user_record};

/// Generate a unique user ID for test isolation.
fn unique_user_id() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}

#[tokio::test]
async fn test_find_principal_strips_password_hash() {
    require_emulator!();

    let db = test_db().await;
    let user_id = unique_user_id();

    assert!(db.find_principal(user_id).await.unwrap().is_none());

    let record = user_record(user_id, Role::LdManager, Some(SubscriptionStatus::PastDue));
    db.upsert_user(&record).await.unwrap();

    let stored = db.get_user(user_id).await.unwrap().unwrap();
    assert_eq!(stored.password_hash, record.password_hash);

    let principal = db.find_principal(user_id).await.unwrap().unwrap();
    assert_eq!(principal.id, user_id);
    assert_eq!(principal.role, Role::LdManager);
    assert_eq!(
        principal.subscription_status,
        Some(SubscriptionStatus::PastDue)
    );
    let json = serde_json::to_value(&principal).unwrap();
    assert!(json.get("password_hash").is_none());

    db.delete_user(user_id).await.unwrap();
    assert!(db.find_principal(user_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_offline_mock_reports_database_error() {
    let db = FirestoreDb::new_mock();
    let err = db.find_principal(1).await.unwrap_err();
    assert!(err.to_string().contains("offline"));
}
