pub mod tracing;

use std::env;
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error type
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable '{0}' is required but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse environment variable '{key}': {details}")]
    ParseError { key: String, details: String },

    #[error("Invalid value for '{key}': {details}")]
    InvalidValue { key: String, details: String },
}

/// Application environment (dev = local runs, prod = deployed worker)
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn from_env() -> Self {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        if app_env.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    pub fn is_development(&self) -> bool {
        matches!(self, Environment::Development)
    }
}

/// Trait for configuration that can be loaded from environment variables
pub trait FromEnv: Sized {
    fn from_env() -> Result<Self, ConfigError>;
}

/// Helper to load and parse environment variable with a default value
pub fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Helper to load and parse environment variable or return error
pub fn env_required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Read the first variable that is set among `keys`
///
/// Used for settings that accept a legacy alias (e.g. `MONGODB_URL` / `MONGO_URL`).
pub fn env_first_of(keys: &[&str]) -> Result<String, ConfigError> {
    keys.iter()
        .find_map(|key| env::var(key).ok())
        .ok_or_else(|| ConfigError::MissingEnvVar(keys.join(" or ")))
}

/// Parse an environment variable into `T`, falling back to `default` when unset
pub fn env_parse_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            key: key.to_string(),
            details: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults_to_development() {
        temp_env::with_var_unset("APP_ENV", || {
            let env = Environment::from_env();
            assert_eq!(env, Environment::Development);
            assert!(env.is_development());
            assert!(!env.is_production());
        });
    }

    #[test]
    fn test_environment_production_case_insensitive() {
        temp_env::with_var("APP_ENV", Some("PRODUCTION"), || {
            assert_eq!(Environment::from_env(), Environment::Production);
        });

        temp_env::with_var("APP_ENV", Some("Production"), || {
            assert!(Environment::from_env().is_production());
        });
    }

    #[test]
    fn test_environment_unknown_defaults_to_development() {
        temp_env::with_var("APP_ENV", Some("staging"), || {
            assert_eq!(Environment::from_env(), Environment::Development);
        });
    }

    #[test]
    fn test_env_or_default() {
        temp_env::with_var("EZBUY_TEST_VAR", Some("value"), || {
            assert_eq!(env_or_default("EZBUY_TEST_VAR", "default"), "value");
        });
        temp_env::with_var_unset("EZBUY_TEST_VAR", || {
            assert_eq!(env_or_default("EZBUY_TEST_VAR", "default"), "default");
        });
    }

    #[test]
    fn test_env_required_missing() {
        temp_env::with_var_unset("EZBUY_MISSING_REQUIRED", || {
            let err = env_required("EZBUY_MISSING_REQUIRED").unwrap_err();
            assert!(err.to_string().contains("EZBUY_MISSING_REQUIRED"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_env_first_of_prefers_first_key() {
        temp_env::with_vars(
            [("EZBUY_PRIMARY", Some("primary")), ("EZBUY_ALIAS", Some("alias"))],
            || {
                let value = env_first_of(&["EZBUY_PRIMARY", "EZBUY_ALIAS"]).unwrap();
                assert_eq!(value, "primary");
            },
        );
    }

    #[test]
    fn test_env_first_of_falls_back_to_alias() {
        temp_env::with_vars(
            [("EZBUY_PRIMARY", None::<&str>), ("EZBUY_ALIAS", Some("alias"))],
            || {
                let value = env_first_of(&["EZBUY_PRIMARY", "EZBUY_ALIAS"]).unwrap();
                assert_eq!(value, "alias");
            },
        );
    }

    #[test]
    fn test_env_first_of_missing_names_all_keys() {
        temp_env::with_vars(
            [("EZBUY_PRIMARY", None::<&str>), ("EZBUY_ALIAS", None::<&str>)],
            || {
                let err = env_first_of(&["EZBUY_PRIMARY", "EZBUY_ALIAS"]).unwrap_err();
                assert!(err.to_string().contains("EZBUY_PRIMARY or EZBUY_ALIAS"));
            },
        );
    }

    #[test]
    fn test_env_parse_or_uses_default_when_unset() {
        temp_env::with_var_unset("EZBUY_LIMIT", || {
            assert_eq!(env_parse_or("EZBUY_LIMIT", 9u32).unwrap(), 9);
        });
    }

    #[test]
    fn test_env_parse_or_parses_value() {
        temp_env::with_var("EZBUY_LIMIT", Some(" 12 "), || {
            assert_eq!(env_parse_or("EZBUY_LIMIT", 9u32).unwrap(), 12);
        });
    }

    #[test]
    fn test_env_parse_or_reports_parse_error() {
        temp_env::with_var("EZBUY_LIMIT", Some("nine"), || {
            let err = env_parse_or("EZBUY_LIMIT", 9u32).unwrap_err();
            assert!(matches!(err, ConfigError::ParseError { ref key, .. } if key == "EZBUY_LIMIT"));
        });
    }
}
