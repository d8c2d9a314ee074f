//! System config accessors.
//!
//! Reads and writes the key-value `system_config` table. The only key in use
//! is `app_version`, read once at startup for display.

use crate::{
    entities::{SystemConfig, system_config},
    errors::Result,
};
use sea_orm::{Set, prelude::*};

const APP_VERSION_KEY: &str = "app_version";

/// Reads the stored application version string, if one has been set.
pub async fn get_app_version(db: &DatabaseConnection) -> Result<Option<String>> {
    let entry = SystemConfig::find()
        .filter(system_config::Column::Key.eq(APP_VERSION_KEY))
        .one(db)
        .await?;

    Ok(entry.map(|e| e.value))
}

/// Stores the application version string, replacing any previous value.
pub async fn set_app_version(db: &DatabaseConnection, version: &str) -> Result<()> {
    let now = chrono::Utc::now().naive_utc();

    let existing = SystemConfig::find()
        .filter(system_config::Column::Key.eq(APP_VERSION_KEY))
        .one(db)
        .await?;

    if let Some(entry) = existing {
        let mut active: system_config::ActiveModel = entry.into();
        active.value = Set(version.to_string());
        active.updated_at = Set(now);
        active.update(db).await?;
    } else {
        let entry = system_config::ActiveModel {
            key: Set(APP_VERSION_KEY.to_string()),
            value: Set(version.to_string()),
            updated_at: Set(now),
            ..Default::default()
        };
        entry.insert(db).await?;
    }

    Ok(())
}
