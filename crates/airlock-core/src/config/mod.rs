//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field has a serde default so partial files are valid.

pub mod logging;
pub mod queue;
pub mod seal;
pub mod store;
pub mod supervisor;

use serde::{Deserialize, Serialize};

use self::logging::LoggingConfig;
use self::queue::{QueueConfig, ReservationConfig};
use self::seal::SealConfig;
use self::store::StoreConfig;
use self::supervisor::{NotifierConfig, SupervisorConfig};

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Shared-store backend settings.
    #[serde(default)]
    pub store: StoreConfig,
    /// Seal settings.
    #[serde(default)]
    pub seal: SealConfig,
    /// Waiting queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Claim reservation settings.
    #[serde(default)]
    pub reservation: ReservationConfig,
    /// Supervisor settings.
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    /// Notification transport settings.
    #[serde(default)]
    pub notifier: NotifierConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml`, an environment-specific overlay and
    /// environment variables prefixed with `AIRLOCK_` (nested with `__`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("AIRLOCK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let parsed: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Parse configuration from an inline TOML document.
    pub fn from_toml(source: &str) -> Result<Self, AppError> {
        let parsed: Self = config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Reject values that would make the admission engine unsafe.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.seal.limit == 0 {
            return Err(AppError::configuration("seal.limit must be at least 1"));
        }
        if self.seal.ttl_seconds == 0 {
            return Err(AppError::configuration(
                "seal.ttl_seconds must be positive; permits require a lease",
            ));
        }
        check_one_of("store.backend", &self.store.backend, &["memory", "redis"])?;
        check_one_of("seal.kind", &self.seal.kind, &["semaphore", "rate_limiter"])?;
        check_one_of("queue.policy", &self.queue.policy, &["fifo", "lottery"])?;
        check_one_of(
            "notifier.kind",
            &self.notifier.kind,
            &["broadcast", "redis", "log"],
        )?;
        if self.supervisor.tick_interval_ms == 0 {
            return Err(AppError::configuration(
                "supervisor.tick_interval_ms must be positive",
            ));
        }
        Ok(())
    }
}

fn check_one_of(field: &str, value: &str, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AppError::configuration(format!(
            "Unknown {field}: '{value}'. Supported: {}",
            allowed.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.seal.limit, 1);
        assert_eq!(config.queue.policy, "fifo");
        assert_eq!(config.supervisor.claim_window_seconds, 30);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = AppConfig::from_toml(
            r#"
            [seal]
            limit = 4
            resource = "reports"

            [queue]
            policy = "lottery"
            "#,
        )
        .unwrap();
        assert_eq!(config.seal.limit, 4);
        assert_eq!(config.seal.resource, "reports");
        assert_eq!(config.seal.ttl_seconds, 300);
        assert_eq!(config.queue.policy, "lottery");
        assert_eq!(config.store.backend, "memory");
    }

    #[test]
    fn test_zero_limit_rejected() {
        let mut config = AppConfig::default();
        config.seal.limit = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = AppConfig::default();
        config.seal.ttl_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_policy_rejected() {
        let err = AppConfig::from_toml("[queue]\npolicy = \"priority\"").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Configuration);
        assert!(err.message.contains("queue.policy"));
    }
}
