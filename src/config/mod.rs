/// Database configuration and connection management
pub mod database;

/// Return policy configuration loading from config.toml
pub mod policy;
