use deadpool_postgres::{Config as PoolConfig, ManagerConfig, Pool, RecyclingMethod};
use futures::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::OnceCell;
use tokio_postgres::NoTls;

use crate::api::middleware::AppError;
use crate::config::DatabaseConfig;
use crate::services::database::{DataStore, PostgresStore, StoreProvider};

type Attempt<T> = Shared<BoxFuture<'static, Result<T, AppError>>>;

/// Lazily initialized value with one shared in-flight attempt
///
/// Every caller that arrives while an attempt is running awaits that same
/// attempt and sees its outcome, success or failure. A failed attempt is
/// dropped so the next caller starts a fresh one.
struct SingleFlight<T: Clone> {
    ready: OnceCell<T>,
    in_flight: Mutex<Option<Attempt<T>>>,
}

impl<T> SingleFlight<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn new() -> Self {
        Self {
            ready: OnceCell::new(),
            in_flight: Mutex::new(None),
        }
    }

    #[cfg(test)]
    fn is_ready(&self) -> bool {
        self.ready.initialized()
    }

    async fn get_or_init<F, Fut>(&self, init: F) -> Result<&T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>> + Send + 'static,
    {
        if let Some(value) = self.ready.get() {
            return Ok(value);
        }

        let attempt = {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            // The previous attempt may have finished between the check above and the lock
            if let Some(value) = self.ready.get() {
                return Ok(value);
            }
            match slot.as_ref() {
                Some(attempt) => attempt.clone(),
                None => {
                    let attempt = init().boxed().shared();
                    *slot = Some(attempt.clone());
                    attempt
                }
            }
        };

        let outcome = attempt.clone().await;

        if let Ok(value) = &outcome {
            let _ = self.ready.set(value.clone());
        }
        {
            let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&attempt)) {
                *slot = None;
            }
        }

        outcome?;
        self.ready
            .get()
            .ok_or_else(|| AppError::Internal("Initialized value missing".to_string()))
    }
}

/// Settings needed to build the pool, owned so a creation attempt can outlive the caller
#[derive(Debug, Clone)]
struct PoolSettings {
    connection_url: String,
    max_pool_size: usize,
    connect_retries: u32,
    connect_retry_delay: Duration,
}

/// Process-wide PostgreSQL pool, created on first use and reused afterwards
///
/// Concurrent first callers share one in-flight initialization and all see
/// its result. A failed initialization leaves nothing behind, so a later
/// request tries again.
pub struct SharedPool {
    pool: SingleFlight<Pool>,
    settings: PoolSettings,
    debug_sql: bool,
}

impl SharedPool {
    pub fn new(config: &DatabaseConfig) -> Self {
        Self {
            pool: SingleFlight::new(),
            settings: PoolSettings {
                connection_url: config.url.clone(),
                max_pool_size: config.max_pool_size,
                connect_retries: config.connect_retries,
                connect_retry_delay: Duration::from_millis(config.connect_retry_delay_ms),
            },
            debug_sql: config.debug_sql,
        }
    }

    /// Get the pool, creating it if no request has done so yet
    pub async fn get(&self) -> Result<&Pool, AppError> {
        let settings = self.settings.clone();
        self.pool.get_or_init(move || create_pool(settings)).await
    }

    #[cfg(test)]
    fn is_initialized(&self) -> bool {
        self.pool.is_ready()
    }

    /// Mask credentials in connection URL for safe logging
    fn mask_credentials(url: &str) -> String {
        if let Ok(parsed_url) = url::Url::parse(url) {
            let mut masked = parsed_url.clone();
            if parsed_url.password().is_some() {
                let _ = masked.set_password(Some("***"));
            }
            masked.to_string()
        } else {
            "[invalid-url]".to_string()
        }
    }
}

async fn create_pool(settings: PoolSettings) -> Result<Pool, AppError> {
    tracing::info!(
        "No postgres pool exists - creating new pool for: {} (max_size: {})",
        SharedPool::mask_credentials(&settings.connection_url),
        settings.max_pool_size
    );

    let mut cfg = PoolConfig::new();
    cfg.url = Some(settings.connection_url.clone());
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = cfg
        .create_pool(Some(deadpool_postgres::Runtime::Tokio1), NoTls)
        .map_err(|e| {
            tracing::error!("Failed to create connection pool: {}", e);
            AppError::ConnectionUnavailable(format!("Failed to create connection pool: {}", e))
        })?;

    pool.resize(settings.max_pool_size);

    wait_for_db(&pool, &settings).await?;
    Ok(pool)
}

/// Ping the database with a fixed number of attempts and a fixed delay between them
async fn wait_for_db(pool: &Pool, settings: &PoolSettings) -> Result<(), AppError> {
    for attempt in 1..=settings.connect_retries {
        match ping(pool).await {
            Ok(()) => {
                tracing::info!("Connected to Postgres");
                return Ok(());
            }
            Err(e) if attempt < settings.connect_retries => {
                tracing::warn!(
                    "DB not ready ({}), retrying in {}ms... ({}/{})",
                    e,
                    settings.connect_retry_delay.as_millis(),
                    attempt,
                    settings.connect_retries
                );
                tokio::time::sleep(settings.connect_retry_delay).await;
            }
            Err(e) => {
                tracing::warn!(
                    "DB not ready ({}) ({}/{})",
                    e,
                    attempt,
                    settings.connect_retries
                );
            }
        }
    }

    tracing::error!(
        "Could not connect to Postgres after {} retries",
        settings.connect_retries
    );
    Err(AppError::ConnectionUnavailable(
        "Could not connect to Postgres after retries".to_string(),
    ))
}

async fn ping(pool: &Pool) -> Result<(), String> {
    let client = pool.get().await.map_err(|e| e.to_string())?;
    client
        .simple_query("SELECT 1")
        .await
        .map(|_| ())
        .map_err(|e| e.to_string())
}

#[async_trait::async_trait]
impl StoreProvider for SharedPool {
    async fn acquire(&self) -> Result<Arc<dyn DataStore>, AppError> {
        let pool = self.get().await?;
        Ok(Arc::new(PostgresStore::new(pool.clone(), self.debug_sql)))
    }
}
