//! `ReturnBuddy` startup binary.
//!
//! Wires the core together: logging, environment, policy config, database,
//! and a startup report of today's reminders. All UI and notification
//! delivery live outside this crate.

use chrono::Utc;
use dotenvy::dotenv;
use return_buddy::config;
use return_buddy::core::{lifecycle, record, session::Session, system};
use return_buddy::errors::Result;
use std::env;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file (non-fatal, env vars can be set externally)
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load policy configuration
    let app_config = config::policy::load_default_config()?;
    info!(
        max_records = app_config.policy.max_records,
        "Loaded return policy configuration."
    );

    // 4. Initialize database
    let db = config::database::create_connection().await?;
    config::database::create_tables(&db).await?;
    info!("Database initialized successfully.");

    // 5. Read the displayed app version from the config surface
    match system::get_app_version(&db).await? {
        Some(version) => info!(%version, "App version"),
        None => warn!("No app version recorded yet."),
    }

    // 6. Report today's reminders for the configured user
    let user_id = env::var("RETURN_BUDDY_USER").unwrap_or_else(|_| "local".to_string());
    let session = Session::new(user_id);
    let today = Utc::now().date_naive();

    let records = record::list_records(&db, &session).await?;
    let reminders = lifecycle::reminders(&records, today);
    info!(
        records = records.len(),
        reminders = reminders.len(),
        "Startup report"
    );
    for reminder in &reminders {
        info!(title = %reminder.title, body = %reminder.body, "reminder");
    }

    Ok(())
}
