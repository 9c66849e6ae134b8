/// Database configuration and connection management
pub mod database;

/// Application settings loaded from drivetrack.toml
pub mod settings;
