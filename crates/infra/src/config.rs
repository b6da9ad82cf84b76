//! Process configuration read from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
const MIN_PRODUCTION_SECRET_LEN: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub environment: Environment,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    /// `Some` selects the Postgres store; `None` the in-memory one.
    pub database: Option<DatabaseConfig>,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("environment", &self.environment)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("persistent", &self.database.is_some())
            .field("bootstrap_admin", &self.bootstrap_admin.as_ref().map(|a| a.email.as_str()))
            .finish()
    }
}

impl AppConfig {
    /// True when `JWT_SECRET` was unset and the insecure development default
    /// is in use. Callers log this once tracing is initialised.
    pub fn uses_dev_jwt_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let environment = match get("APP_ENV").as_deref() {
            None | Some("development") | Some("dev") | Some("test") => Environment::Development,
            Some("production") | Some("prod") => Environment::Production,
            Some(other) => return Err(invalid("APP_ENV", other, "expected development or production")),
        };

        let bind_addr = match get("BIND_ADDR") {
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
            Some(raw) => raw.parse().map_err(|e| invalid("BIND_ADDR", &raw, e))?,
        };

        let jwt_secret = match get("JWT_SECRET") {
            Some(secret) if environment.is_production() && secret.len() < MIN_PRODUCTION_SECRET_LEN => {
                return Err(invalid(
                    "JWT_SECRET",
                    "<redacted>",
                    format!("must be at least {MIN_PRODUCTION_SECRET_LEN} bytes in production"),
                ));
            }
            Some(secret) => secret,
            None if environment.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            None => DEV_JWT_SECRET.to_string(),
        };

        let token_ttl_hours: i64 = parse_or("TOKEN_TTL_HOURS", get("TOKEN_TTL_HOURS"), 24)?;
        if token_ttl_hours <= 0 {
            return Err(invalid("TOKEN_TTL_HOURS", &token_ttl_hours.to_string(), "must be positive"));
        }

        let bcrypt_cost: u32 = parse_or("BCRYPT_COST", get("BCRYPT_COST"), 12)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(invalid("BCRYPT_COST", &bcrypt_cost.to_string(), "must be within 4..=31"));
        }

        let persistent: bool = parse_or("USE_PERSISTENT_STORES", get("USE_PERSISTENT_STORES"), false)?;
        let database = if persistent {
            let url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
            let max_connections: u32 = parse_or("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), 10)?;
            if max_connections == 0 {
                return Err(invalid("DATABASE_MAX_CONNECTIONS", "0", "must be positive"));
            }
            let timeout_secs: u64 =
                parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", get("DATABASE_ACQUIRE_TIMEOUT_SECS"), 5)?;
            Some(DatabaseConfig {
                url,
                max_connections,
                acquire_timeout: Duration::from_secs(timeout_secs),
            })
        } else {
            None
        };

        let bootstrap_admin = match (get("BOOTSTRAP_ADMIN_EMAIL"), get("BOOTSTRAP_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(BootstrapAdmin { email, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("BOOTSTRAP_ADMIN_EMAIL")),
        };

        Ok(Self {
            bind_addr,
            environment,
            jwt_secret,
            token_ttl_hours,
            bcrypt_cost,
            database,
            bootstrap_admin,
        })
    }
}

fn invalid(var: &'static str, value: &str, reason: impl ToString) -> ConfigError {
    ConfigError::Invalid {
        var,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn parse_or<T>(var: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(raw) => raw.parse().map_err(|e| invalid(var, &raw, e)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_select_in_memory_development() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.environment, Environment::Development);
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.token_ttl_hours, 24);
        assert_eq!(cfg.bcrypt_cost, 12);
        assert!(cfg.database.is_none());
        assert!(cfg.bootstrap_admin.is_none());
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert!(cfg.uses_dev_jwt_secret());
    }

    #[test]
    fn explicit_secret_is_not_reported_as_dev_default() {
        let cfg = config(&[("JWT_SECRET", "a-real-secret")]).unwrap();
        assert!(!cfg.uses_dev_jwt_secret());
    }

    #[test]
    fn production_requires_a_strong_secret() {
        assert_eq!(
            config(&[("APP_ENV", "production")]).unwrap_err(),
            ConfigError::Missing("JWT_SECRET")
        );
        assert!(matches!(
            config(&[("APP_ENV", "production"), ("JWT_SECRET", "short")]),
            Err(ConfigError::Invalid { var: "JWT_SECRET", .. })
        ));
        let secret = "x".repeat(MIN_PRODUCTION_SECRET_LEN);
        assert!(config(&[("APP_ENV", "production"), ("JWT_SECRET", &secret)]).is_ok());
    }

    #[test]
    fn persistent_stores_need_a_database_url() {
        assert_eq!(
            config(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err(),
            ConfigError::Missing("DATABASE_URL")
        );
        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("DATABASE_URL", "postgres://localhost/hireflow"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        let db = cfg.database.unwrap();
        assert_eq!(db.max_connections, 4);
        assert_eq!(db.acquire_timeout, Duration::from_secs(5));
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        assert!(matches!(
            config(&[("BCRYPT_COST", "3")]),
            Err(ConfigError::Invalid { var: "BCRYPT_COST", .. })
        ));
        assert!(matches!(
            config(&[("TOKEN_TTL_HOURS", "soon")]),
            Err(ConfigError::Invalid { var: "TOKEN_TTL_HOURS", .. })
        ));
    }

    #[test]
    fn bootstrap_admin_needs_both_halves() {
        assert_eq!(
            config(&[("BOOTSTRAP_ADMIN_EMAIL", "root@example.test")]).unwrap_err(),
            ConfigError::Missing("BOOTSTRAP_ADMIN_PASSWORD")
        );
    }

    #[test]
    fn debug_output_redacts_the_secret() {
        let cfg = config(&[("JWT_SECRET", "super-secret-value")]).unwrap();
        assert!(!format!("{cfg:?}").contains("super-secret-value"));
    }
}
