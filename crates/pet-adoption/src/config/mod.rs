use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::adoption::{AdoptionPolicy, DefaultAdmin, PasswordPolicy};

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Distinguishes runtime behavior for different stages of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub storage: StorageConfig,
    pub session: SessionConfig,
    pub policy: AdoptionPolicy,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let data_dir = env::var("ADOPTION_DATA_DIR").unwrap_or_else(|_| ".".to_string());

        let max_attempts = match env::var("ADOPTION_MAX_ATTEMPTS") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|attempts| *attempts > 0)
                .ok_or(ConfigError::InvalidMaxAttempts { value: raw })?,
            Err(_) => DEFAULT_MAX_ATTEMPTS,
        };

        let password = match env::var("ADOPTION_PASSWORD_POLICY") {
            Ok(raw) => {
                PasswordPolicy::parse(&raw).ok_or(ConfigError::InvalidPasswordPolicy { value: raw })?
            }
            Err(_) => PasswordPolicy::default(),
        };

        let default_admin = match env::var("ADOPTION_DEFAULT_ADMIN") {
            Ok(raw) => DefaultAdmin::parse(&raw).ok_or(ConfigError::InvalidFlag {
                name: "ADOPTION_DEFAULT_ADMIN",
                value: raw,
            })?,
            Err(_) => DefaultAdmin::default(),
        };

        let seed_sample_pets = match env::var("ADOPTION_SEED_PETS") {
            Ok(raw) => parse_flag(&raw).ok_or(ConfigError::InvalidFlag {
                name: "ADOPTION_SEED_PETS",
                value: raw,
            })?,
            Err(_) => true,
        };

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());

        Ok(Self {
            environment,
            storage: StorageConfig {
                data_dir: PathBuf::from(data_dir),
            },
            session: SessionConfig { max_attempts },
            policy: AdoptionPolicy {
                password,
                default_admin,
                seed_sample_pets,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Where the `.dat` files live.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

/// Interactive prompt controls.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Invalid entries allowed before a prompt gives up and returns to the menu.
    pub max_attempts: u32,
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidMaxAttempts { value: String },
    InvalidPasswordPolicy { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidMaxAttempts { value } => {
                write!(f, "ADOPTION_MAX_ATTEMPTS must be a positive integer, got '{value}'")
            }
            ConfigError::InvalidPasswordPolicy { value } => {
                write!(
                    f,
                    "ADOPTION_PASSWORD_POLICY must be 'basic' or 'strict', got '{value}'"
                )
            }
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{name} must be a boolean flag, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("ADOPTION_DATA_DIR");
        env::remove_var("ADOPTION_MAX_ATTEMPTS");
        env::remove_var("ADOPTION_PASSWORD_POLICY");
        env::remove_var("ADOPTION_DEFAULT_ADMIN");
        env::remove_var("ADOPTION_SEED_PETS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.storage.data_dir, PathBuf::from("."));
        assert_eq!(config.session.max_attempts, DEFAULT_MAX_ATTEMPTS);
        assert_eq!(config.policy, AdoptionPolicy::default());
        assert_eq!(config.telemetry.log_level, "warn");
    }

    #[test]
    fn overrides_are_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_ENV", "prod");
        env::set_var("ADOPTION_DATA_DIR", "/var/lib/adoption");
        env::set_var("ADOPTION_MAX_ATTEMPTS", "5");
        env::set_var("ADOPTION_PASSWORD_POLICY", "strict");
        env::set_var("ADOPTION_DEFAULT_ADMIN", "disabled");
        env::set_var("ADOPTION_SEED_PETS", "no");

        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.environment, AppEnvironment::Production);
        assert_eq!(config.storage.data_dir, PathBuf::from("/var/lib/adoption"));
        assert_eq!(config.session.max_attempts, 5);
        assert_eq!(config.policy.password, PasswordPolicy::Strict);
        assert_eq!(config.policy.default_admin, DefaultAdmin::Disabled);
        assert!(!config.policy.seed_sample_pets);
    }

    #[test]
    fn rejects_zero_attempts() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADOPTION_MAX_ATTEMPTS", "0");
        let result = AppConfig::load();
        reset_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidMaxAttempts { .. })
        ));
    }

    #[test]
    fn rejects_unknown_password_policy() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADOPTION_PASSWORD_POLICY", "paranoid");
        let result = AppConfig::load();
        reset_env();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidPasswordPolicy { .. })
        ));
    }
}
