//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresCycleRepository` - the `cycles` read model
//! - `connect` - pool construction and embedded migrations

mod cycle_repository;

pub use cycle_repository::PostgresCycleRepository;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;

/// Opens a connection pool sized by `config`, running migrations when
/// `run_migrations` is set.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::database(format!("Failed to connect to database: {}", e)))?;

    if config.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))?;
        tracing::info!("Database migrations applied");
    }

    Ok(pool)
}
