//! Service wiring.
//!
//! Builds the adapters named by `AppConfig` and assembles the lifecycle
//! service and the cycle handlers on top of them.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use thiserror::Error;

use crate::adapters::actor_runtime::ActorRuntimeClient;
use crate::adapters::cache::{LruCycleCache, RedisCycleCache};
use crate::adapters::postgres::{self, PostgresCycleRepository};
use crate::application::handlers::cycle::{
    DeleteCycleHandler, DeleteUserCyclesHandler, GetCycleHandler, GetCycleInProgressHandler,
    GetCycleStatisticsHandler, ListCycleHistoryHandler, ValidateCycleOverlapHandler,
};
use crate::application::{CycleLifecycleService, RefCache};
use crate::config::{AppConfig, CacheBackend, CacheConfig, RedisConfig};
use crate::domain::foundation::DomainError;
use crate::ports::{ActiveCycleIndex, ActorRuntimeError, CycleCache, CycleRepository, SnapshotStore};

/// Failures while building the service graph.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Database setup failed: {0}")]
    Database(#[from] DomainError),

    #[error("Redis setup failed: {0}")]
    Redis(String),

    #[error("Actor runtime client setup failed: {0}")]
    ActorRuntime(#[from] ActorRuntimeError),

    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

/// Everything the API layer needs to serve cycle requests.
pub struct AppServices {
    pub lifecycle: Arc<CycleLifecycleService>,
    pub cache: Arc<RefCache>,
    pub get_cycle: GetCycleHandler,
    pub get_cycle_in_progress: GetCycleInProgressHandler,
    pub get_cycle_statistics: GetCycleStatisticsHandler,
    pub list_cycle_history: ListCycleHistoryHandler,
    pub validate_cycle_overlap: ValidateCycleOverlapHandler,
    pub delete_cycle: DeleteCycleHandler,
    pub delete_user_cycles: DeleteUserCyclesHandler,
}

impl AppServices {
    /// Assembles services over already-built ports.
    pub fn from_ports(
        repository: Arc<dyn CycleRepository>,
        snapshots: Arc<dyn SnapshotStore>,
        index: Arc<dyn ActiveCycleIndex>,
        cache_backend: Arc<dyn CycleCache>,
    ) -> Self {
        let cache = Arc::new(RefCache::new(cache_backend, repository.clone()));
        let lifecycle = Arc::new(CycleLifecycleService::new(
            snapshots.clone(),
            index.clone(),
            repository.clone(),
            cache.clone(),
        ));

        Self {
            lifecycle,
            get_cycle: GetCycleHandler::new(repository.clone()),
            get_cycle_in_progress: GetCycleInProgressHandler::new(cache.clone()),
            get_cycle_statistics: GetCycleStatisticsHandler::new(repository.clone(), cache.clone()),
            list_cycle_history: ListCycleHistoryHandler::new(repository.clone()),
            validate_cycle_overlap: ValidateCycleOverlapHandler::new(repository.clone()),
            delete_cycle: DeleteCycleHandler::new(repository.clone()),
            delete_user_cycles: DeleteUserCyclesHandler::new(
                repository,
                index,
                snapshots,
                cache.clone(),
            ),
            cache,
        }
    }
}

/// Connects every configured backend and returns the services together with
/// the database pool, which the caller closes on shutdown.
pub async fn bootstrap(config: &AppConfig) -> Result<(AppServices, PgPool), BootstrapError> {
    let pool = postgres::connect(&config.database).await?;
    tracing::info!("Database connection established");

    let repository: Arc<dyn CycleRepository> = Arc::new(PostgresCycleRepository::new(pool.clone()));
    let runtime = Arc::new(ActorRuntimeClient::new(&config.actor_runtime)?);
    let cache = build_cache(&config.cache, config.redis.as_ref()).await?;

    tracing::info!(
        actor_runtime = %config.actor_runtime.base_url,
        cache_backend = ?config.cache.backend,
        cache_ttl_secs = config.cache.ttl_secs,
        "Services configured"
    );

    let services = AppServices::from_ports(repository, runtime.clone(), runtime, cache);
    Ok((services, pool))
}

/// Builds the cache backend selected by `cache.backend`.
pub async fn build_cache(
    cache: &CacheConfig,
    redis: Option<&RedisConfig>,
) -> Result<Arc<dyn CycleCache>, BootstrapError> {
    match cache.backend {
        CacheBackend::Memory => Ok(Arc::new(LruCycleCache::new(cache.capacity, cache.ttl()))),
        CacheBackend::Redis => {
            let redis = redis.ok_or(BootstrapError::MissingConfig("redis"))?;
            let conn = connect_redis(&redis.url, redis.timeout()).await?;
            tracing::info!("Redis connection established");
            Ok(Arc::new(RedisCycleCache::new(conn, cache.ttl())))
        }
    }
}

async fn connect_redis(
    url: &str,
    timeout: Duration,
) -> Result<redis::aio::MultiplexedConnection, BootstrapError> {
    let client = redis::Client::open(url).map_err(|e| BootstrapError::Redis(e.to_string()))?;
    tokio::time::timeout(timeout, client.get_multiplexed_tokio_connection())
        .await
        .map_err(|_| BootstrapError::Redis(format!("connection timed out after {:?}", timeout)))?
        .map_err(|e| BootstrapError::Redis(e.to_string()))
}
