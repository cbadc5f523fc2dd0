use std::collections::BTreeMap;
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoordinatorConfig {
    /// Number of worker loops in the pool
    #[serde(default = "default_num_workers")]
    pub num_workers: usize,
    /// Planning loop wake-up interval in milliseconds
    #[serde(default = "default_planner_interval_ms")]
    pub planner_interval_ms: u64,
    /// Blocking-pop timeout for both queues in milliseconds; also the
    /// cancellation-check cadence of the worker and judge loops
    #[serde(default = "default_pop_timeout_ms")]
    pub pop_timeout_ms: u64,
    /// Bounded retries for the coordinator's own read-modify-commit cycles
    #[serde(default = "default_commit_retry_limit")]
    pub commit_retry_limit: u32,
}

fn default_num_workers() -> usize {
    3
}

fn default_planner_interval_ms() -> u64 {
    5_000
}

fn default_pop_timeout_ms() -> u64 {
    5_000
}

fn default_commit_retry_limit() -> u32 {
    5
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            planner_interval_ms: default_planner_interval_ms(),
            pop_timeout_ms: default_pop_timeout_ms(),
            commit_retry_limit: default_commit_retry_limit(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BudgetConfig {
    /// Per-currency daily spend ceilings
    #[serde(default = "default_daily_limits")]
    pub daily_limits: BTreeMap<String, Decimal>,
    /// Per-currency suspicious-amount thresholds (independent of the
    /// ceilings; an amount above its threshold is escalated, not rejected)
    #[serde(default = "default_suspicious_thresholds")]
    pub suspicious_thresholds: BTreeMap<String, Decimal>,
}

fn default_daily_limits() -> BTreeMap<String, Decimal> {
    let mut limits = BTreeMap::new();
    limits.insert("USDC".to_string(), dec!(50));
    limits.insert("ETH".to_string(), dec!(0.01));
    limits.insert("USD".to_string(), dec!(50));
    limits
}

fn default_suspicious_thresholds() -> BTreeMap<String, Decimal> {
    let mut thresholds = BTreeMap::new();
    thresholds.insert("USDC".to_string(), dec!(100));
    thresholds.insert("ETH".to_string(), dec!(0.1));
    thresholds.insert("USD".to_string(), dec!(100));
    thresholds
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_limits: default_daily_limits(),
            suspicious_thresholds: default_suspicious_thresholds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("MAESTRO_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (MAESTRO_COORDINATOR__NUM_WORKERS, etc.)
            .add_source(
                Environment::with_prefix("MAESTRO")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.coordinator.num_workers == 0 {
            errors.push("coordinator.num_workers must be at least 1".to_string());
        }

        if self.coordinator.pop_timeout_ms == 0 {
            errors.push("coordinator.pop_timeout_ms must be non-zero".to_string());
        }

        for (currency, limit) in &self.budget.daily_limits {
            if *limit < Decimal::ZERO {
                errors.push(format!("budget.daily_limits.{currency} must not be negative"));
            }
        }

        for (currency, threshold) in &self.budget.suspicious_thresholds {
            if *threshold < Decimal::ZERO {
                errors.push(format!(
                    "budget.suspicious_thresholds.{currency} must not be negative"
                ));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            coordinator: CoordinatorConfig::default(),
            budget: BudgetConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.coordinator.num_workers, 3);
        assert_eq!(config.budget.daily_limits["USDC"], dec!(50));
        assert_eq!(config.budget.suspicious_thresholds["USDC"], dec!(100));
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let mut config = AppConfig::default();
        config.coordinator.num_workers = 0;
        let errors = config.validate().unwrap_err();
        assert!(errors.iter().any(|e| e.contains("num_workers")));
    }
}
