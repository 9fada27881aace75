use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::limiter::{LimiterError, RateLimiter};
use crate::log_info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantConfig {
    pub api: ApiConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the SpaceTraders API
    pub base_url: String,
    /// File the agent bearer token is read from
    pub token_file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Requests admitted per window
    pub capacity: u32,
    /// Window length in milliseconds
    pub interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 0=error, 1=info, 2=debug, 3=trace
    pub level: u8,
}

impl Default for MerchantConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: crate::API_BASE_URL.to_string(),
                token_file: crate::AGENT_TOKEN_FILE.to_string(),
            },
            rate_limit: RateLimitConfig {
                capacity: crate::DEFAULT_RATE_CAPACITY,
                interval_ms: crate::DEFAULT_RATE_INTERVAL_MS,
            },
            logging: LoggingConfig { level: 1 },
        }
    }
}

impl MerchantConfig {
    /// Load configuration from file, creating the default one if missing.
    pub fn load_or_create(config_path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        if Path::new(config_path).exists() {
            let config_str = fs::read_to_string(config_path)?;
            let config: MerchantConfig = toml::from_str(&config_str)?;
            config.validate()?;
            Ok(config)
        } else {
            log_info!("writing default configuration to {}", config_path);
            let config = MerchantConfig::default();
            config.save(config_path)?;
            Ok(config)
        }
    }

    pub fn save(&self, config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = Path::new(config_path).parent() {
            fs::create_dir_all(parent)?;
        }
        let config_str = toml::to_string_pretty(self)?;
        fs::write(config_path, config_str)?;
        Ok(())
    }

    /// Reject invalid values outright; nothing is silently clamped.
    pub fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.api.base_url.is_empty() {
            return Err("api.base_url must not be empty".into());
        }
        if self.rate_limit.capacity == 0 {
            return Err(Box::new(LimiterError::ZeroCapacity));
        }
        if self.rate_limit.interval_ms == 0 {
            return Err(Box::new(LimiterError::ZeroInterval));
        }
        Ok(())
    }

    pub fn refill_interval(&self) -> Duration {
        Duration::from_millis(self.rate_limit.interval_ms)
    }

    /// Build a limiter with the configured quota.
    pub fn build_limiter(&self) -> Result<RateLimiter, LimiterError> {
        RateLimiter::new(self.rate_limit.capacity, self.refill_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MerchantConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rate_limit.capacity, 2);
        assert_eq!(config.refill_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut config = MerchantConfig::default();
        config.rate_limit.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut config = MerchantConfig::default();
        config.rate_limit.interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = MerchantConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: MerchantConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.rate_limit.capacity, config.rate_limit.capacity);
        assert_eq!(parsed.api.base_url, config.api.base_url);
    }
}
