use crate::core::{AppError, Result};
use chrono::{FixedOffset, Offset, Utc};
use std::env;
use std::str::FromStr;
use std::time::Duration;

pub mod database;
pub mod server;

pub use database::DatabaseConfig;
pub use server::ServerConfig;

use crate::core::clock::billing_offset;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub billing: BillingConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub log_level: String,
    /// `json` for structured output, anything else for human-readable lines
    pub log_format: String,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Tunables for the billing cycle
/// One year
pub const MAX_RESCHEDULE_HOURS: u32 = 24 * 365;

#[derive(Debug, Clone)]
pub struct BillingConfig {
    /// Upper bound on invoices processed concurrently within one cycle
    pub max_concurrency: usize,
    /// Deadline for a single gateway charge; expiry counts as unreachable
    pub charge_timeout_secs: u64,
    /// How far an invoice is pushed back after an unreachable gateway
    pub reschedule_hours: u32,
    /// Offset from UTC of the billing day, in minutes
    pub utc_offset_minutes: i32,
    /// Whether to run a cycle at startup, before the first midnight
    pub run_on_startup: bool,
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            charge_timeout_secs: 30,
            reschedule_hours: 24,
            utc_offset_minutes: 0,
            run_on_startup: true,
        }
    }
}

impl BillingConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(BillingConfig {
            max_concurrency: env_or("BILLING_MAX_CONCURRENCY", defaults.max_concurrency)?,
            charge_timeout_secs: env_or(
                "BILLING_CHARGE_TIMEOUT_SECS",
                defaults.charge_timeout_secs,
            )?,
            reschedule_hours: env_or("BILLING_RESCHEDULE_HOURS", defaults.reschedule_hours)?,
            utc_offset_minutes: env_or(
                "BILLING_UTC_OFFSET_MINUTES",
                defaults.utc_offset_minutes,
            )?,
            run_on_startup: env_or("BILLING_RUN_ON_STARTUP", defaults.run_on_startup)?,
        })
    }

    pub fn charge_timeout(&self) -> Duration {
        Duration::from_secs(self.charge_timeout_secs)
    }

    pub fn reschedule_interval(&self) -> chrono::Duration {
        chrono::Duration::try_hours(i64::from(self.reschedule_hours))
            .unwrap_or(chrono::Duration::MAX)
    }

    /// Offset of the billing day; falls back to UTC if out of range
    /// (`validate` rejects that case before it can matter)
    pub fn offset(&self) -> FixedOffset {
        billing_offset(self.utc_offset_minutes).unwrap_or_else(|| Utc.fix())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(AppError::Configuration(
                "Billing concurrency must be greater than 0".to_string(),
            ));
        }

        if self.charge_timeout_secs == 0 {
            return Err(AppError::Configuration(
                "Charge timeout must be greater than 0".to_string(),
            ));
        }

        if self.reschedule_hours == 0 || self.reschedule_hours > MAX_RESCHEDULE_HOURS {
            return Err(AppError::Configuration(format!(
                "Reschedule interval must be between 1 and {} hours, got {}",
                MAX_RESCHEDULE_HOURS, self.reschedule_hours
            )));
        }

        if billing_offset(self.utc_offset_minutes).is_none() {
            return Err(AppError::Configuration(format!(
                "Billing UTC offset out of range: {} minutes",
                self.utc_offset_minutes
            )));
        }

        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = Config {
            app: AppConfig {
                env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
                log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
                log_format: env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
            database: DatabaseConfig::from_env()?,
            server: ServerConfig::from_env()?,
            gateway: GatewayConfig {
                api_key: env::var("GATEWAY_API_KEY")
                    .map_err(|_| AppError::Configuration("GATEWAY_API_KEY not set".to_string()))?,
                base_url: env::var("GATEWAY_BASE_URL")
                    .map_err(|_| AppError::Configuration("GATEWAY_BASE_URL not set".to_string()))?,
            },
            billing: BillingConfig::from_env()?,
        };

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(AppError::Configuration(
                "Gateway base URL must not be empty".to_string(),
            ));
        }

        self.database.validate()?;
        self.billing.validate()
    }
}

pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Configuration(format!("Invalid {}", key))),
        Err(_) => Ok(default),
    }
}
