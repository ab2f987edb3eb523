use qryvanta_core::AppError;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Opens the Postgres pool. No `sqlx::migrate!` step: this repo carries no
/// `crates/infrastructure/migrations` directory, per DESIGN.md's
/// migration-gated-tests note; schema is assumed to already exist.
pub async fn connect(database_url: &str) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|error| AppError::StorageError(format!("failed to connect to database: {error}")))
}
