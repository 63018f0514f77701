use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::info;

use super::StoreError;
use crate::config;

/// Process-wide connection pool, created lazily from DATABASE_URL.
///
/// Connections are established on first use (`connect_lazy`), so holding a
/// pool handle never blocks startup and pool construction only fails on
/// missing or malformed configuration.
pub struct PoolManager;

static POOL: OnceLock<PgPool> = OnceLock::new();

impl PoolManager {
    pub fn pool() -> Result<PgPool, StoreError> {
        if let Some(pool) = POOL.get() {
            return Ok(pool.clone());
        }

        let url = std::env::var("DATABASE_URL")
            .map_err(|_| StoreError::ConfigMissing("DATABASE_URL"))?;

        let db = &config::config().database;
        let pool = PgPoolOptions::new()
            .max_connections(db.max_connections)
            .acquire_timeout(Duration::from_secs(db.acquire_timeout_secs))
            .connect_lazy(&url)?;

        // A concurrent initializer may have won the race; use whichever landed.
        let pool = match POOL.set(pool.clone()) {
            Ok(()) => {
                info!("Created database pool");
                pool
            }
            Err(_) => POOL.get().cloned().unwrap_or(pool),
        };

        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check() -> Result<(), StoreError> {
        let pool = Self::pool()?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok(())
    }

    /// Close the pool (e.g., on shutdown)
    pub async fn close() {
        if let Some(pool) = POOL.get() {
            pool.close().await;
            info!("Closed database pool");
        }
    }
}
