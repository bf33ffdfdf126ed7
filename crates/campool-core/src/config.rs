//! Service configuration.
//!
//! Supports configuration via environment variables:
//!
//! ```bash
//! # Retention windows (days)
//! CAMPOOL_UNCONFIRMED_RETENTION_DAYS=7
//! CAMPOOL_CONFIRMED_RETENTION_DAYS=30
//! CAMPOOL_CHAT_RETENTION_DAYS=30
//!
//! # Listing horizon (hours before now a scheduled ride stays listed)
//! CAMPOOL_LISTING_LOOKBACK_HOURS=12
//! ```
//!
//! All values default to the production retention policy when unset.

use std::env;
use thiserror::Error;

/// Service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Days a ride with no confirmed users is kept past its scheduled time.
    pub unconfirmed_retention_days: i64,
    /// Days a ride with confirmed users is kept past its scheduled time.
    pub confirmed_retention_days: i64,
    /// Days a chat thread is kept past its last message.
    pub chat_retention_days: i64,
    /// How far into the past a ride's scheduled time may lie and still show
    /// up in the institution listing.
    pub listing_lookback_hours: i64,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            unconfirmed_retention_days: 7,
            confirmed_retention_days: 30,
            chat_retention_days: 30,
            listing_lookback_hours: 12,
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("{0} must be positive, got {1}")]
    NonPositive(&'static str, i64),
}

fn env_positive(var: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(var) {
        Ok(raw) => {
            let value = raw
                .parse::<i64>()
                .map_err(|_| ConfigError::InvalidValue(var, raw.clone()))?;
            if value <= 0 {
                return Err(ConfigError::NonPositive(var, value));
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

impl ServiceConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            unconfirmed_retention_days: env_positive(
                "CAMPOOL_UNCONFIRMED_RETENTION_DAYS",
                defaults.unconfirmed_retention_days,
            )?,
            confirmed_retention_days: env_positive(
                "CAMPOOL_CONFIRMED_RETENTION_DAYS",
                defaults.confirmed_retention_days,
            )?,
            chat_retention_days: env_positive(
                "CAMPOOL_CHAT_RETENTION_DAYS",
                defaults.chat_retention_days,
            )?,
            listing_lookback_hours: env_positive(
                "CAMPOOL_LISTING_LOOKBACK_HOURS",
                defaults.listing_lookback_hours,
            )?,
        })
    }
}
