use std::env;
use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use super::env_or;
use crate::core::{AppError, Result};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);
const MAX_LIFETIME: Duration = Duration::from_secs(1800);

/// MySQL connection settings
///
/// `pool_size` connections are kept open; the pool grows up to `max_connections`
/// while a billing cycle and REST queries run side by side.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub max_connections: u32,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        let url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Configuration("DATABASE_URL not set".to_string()))?;

        Ok(Self {
            url,
            pool_size: env_or("DATABASE_POOL_SIZE", 5)?,
            max_connections: env_or("DATABASE_MAX_CONNECTIONS", 20)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 || self.pool_size > self.max_connections {
            return Err(AppError::Configuration(format!(
                "Database pool size {} must not exceed max connections {}",
                self.pool_size, self.max_connections
            )));
        }
        Ok(())
    }

    pub async fn create_pool(&self) -> Result<MySqlPool> {
        let pool = MySqlPoolOptions::new()
            .min_connections(self.pool_size)
            .max_connections(self.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .idle_timeout(IDLE_TIMEOUT)
            .max_lifetime(MAX_LIFETIME)
            .test_before_acquire(true)
            .connect(&self.url)
            .await?;

        Ok(pool)
    }
}
