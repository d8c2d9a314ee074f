//! Shared test utilities for `ReturnBuddy`.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test records with sensible defaults.

#![allow(clippy::unwrap_used)]

use crate::{
    config::policy::ReturnPolicy,
    core::{record, session::Session, validation::ValidatedRecord},
    entities,
    errors::Result,
};
use chrono::NaiveDate;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The session used by default in tests.
pub fn test_session() -> Session {
    Session::new("test_user")
}

/// The default policy (25-record ceiling, lenient date knobs).
pub fn test_policy() -> ReturnPolicy {
    ReturnPolicy::default()
}

/// A validated record with sensible defaults.
///
/// # Defaults
/// * `price_cents`: 4550 ($45.50)
/// * `purchase_date`: 2025-01-10
/// * `return_by_date`: 2025-02-10
/// * `returned_date`: None
pub fn test_validated(store_name: &str) -> ValidatedRecord {
    ValidatedRecord {
        store_name: store_name.to_string(),
        price_cents: 4550,
        purchase_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        return_by_date: Some(NaiveDate::from_ymd_opt(2025, 2, 10).unwrap()),
        returned_date: None,
    }
}

/// Creates a test record with the default validated fields and policy.
pub async fn create_test_record(
    db: &DatabaseConnection,
    session: &Session,
    store_name: &str,
) -> Result<entities::return_record::Model> {
    record::create_record(db, session, &test_validated(store_name), &test_policy()).await
}
