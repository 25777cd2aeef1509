//! Application configuration loaded from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;

use blog_infra::database::{DEFAULT_DATABASE_URL, DatabaseConfig};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    /// Upgrade the database to the newest migration before serving.
    pub auto_migrate: bool,
    pub secret_key: SecretKey,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            min_connections: parse_or("DB_MIN_CONNECTIONS", 1),
            ..DatabaseConfig::default()
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_or("PORT", 8080),
            database,
            auto_migrate: env::var("AUTO_MIGRATE")
                .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            secret_key: SecretKey::from_env(),
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Key for signing anything the server hands out (sessions, form tokens).
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(String);

impl SecretKey {
    /// Read `SECRET_KEY`, or generate a key for this process only.
    pub fn from_env() -> Self {
        match env::var("SECRET_KEY") {
            Ok(key) if !key.is_empty() => Self(key),
            _ => {
                tracing::warn!(
                    "SECRET_KEY not set. Using a random key; signed data will not survive a restart."
                );
                Self::generate()
            }
        }
    }

    /// 32 random bytes, hex encoded.
    pub fn generate() -> Self {
        let bytes: [u8; 32] = rand::random();
        Self(hex::encode(bytes))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(***)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_differ() {
        let a = SecretKey::generate();
        let b = SecretKey::generate();

        assert_eq!(a.expose().len(), 64);
        assert_ne!(a, b);
    }

    #[test]
    fn test_secret_key_is_not_printed() {
        let key = SecretKey::generate();
        let printed = format!("{key:?}");

        assert!(!printed.contains(key.expose()));
    }
}
