//! Postgres persistence for the edupush notification core.
//!
//! Repositories follow the static-struct-over-`PgPool` convention; raw rows
//! live in [`models`] and are decoded into the `edupush-core` domain types
//! at the repository boundary. [`backend::PgBackend`] adapts the
//! repositories to the core collaborator contracts.

use sqlx::postgres::PgPoolOptions;

pub mod backend;
pub mod error;
pub mod models;
pub mod repositories;

pub use error::StoreError;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Cheap connectivity probe used at startup.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from the embedded `migrations/` directory.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
