//! Database configuration module for `DriveTrack`.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with `Schema::create_table_from_entity`,
//! so the schema (including the `ON DELETE CASCADE` foreign keys that remove a student's
//! records with the student) always matches the Rust structs.

use crate::entities::{Attendance, Enrollment, Instructor, LocalSetting, Student, Transaction};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::debug;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/drivetrack.sqlite?mode=rwc";

/// Gets the database URL from the environment or returns the default `SQLite` path.
///
/// `.env` is loaded first so a local file can provide `DATABASE_URL`.
#[must_use]
pub fn get_database_url() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database named by `DATABASE_URL`.
///
/// Falls back to a local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    connect(&get_database_url()).await
}

/// Connects to an explicit database URL.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Students are created first because every other billing table references them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    for mut table in [
        schema.create_table_from_entity(Student),
        schema.create_table_from_entity(Enrollment),
        schema.create_table_from_entity(Attendance),
        schema.create_table_from_entity(Transaction),
        schema.create_table_from_entity(Instructor),
        schema.create_table_from_entity(LocalSetting),
    ] {
        table.if_not_exists();
        db.execute(builder.build(&table)).await?;
    }

    Ok(())
}
