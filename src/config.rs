use std::env;
use std::time::Duration;

use crate::services::freshness::{ACTIVE_WINDOW, STALE_WINDOW};

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub minio: MinioConfig,
    pub jwt: JwtConfig,
    pub presence: PresenceConfig,
    pub relay: RelayConfig,
    pub devices: DeviceConfig,
    pub mail: MailConfig,
    pub seed: SeedConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub body_limit: usize,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub ssl_mode: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub password: Option<String>,
    pub db: i64,
}

#[derive(Debug, Clone)]
pub struct MinioConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub use_ssl: bool,
    pub region: String,
    pub avatars_bucket: String,
    pub public_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub token_ttl: Duration,
    pub issuer: String,
}

#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub stale_window: Duration,
}

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub backend: RelayBackend,
    pub active_window: Duration,
}

/// Where the live RFID mailbox lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayBackend {
    /// Process-local slot; each instance has its own mailbox.
    Memory,
    /// Shared slot in Redis for multi-instance deployments.
    Redis,
}

impl RelayBackend {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Some(Self::Memory),
            "redis" => Some(Self::Redis),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub delete_logs: LogRetention,
}

/// What happens to a device's attendance logs when the device is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRetention {
    Purge,
    Detach,
}

impl LogRetention {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "purge" => Some(Self::Purge),
            "detach" => Some(Self::Detach),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct SeedConfig {
    pub admin_username: String,
    pub admin_password: String,
}

impl Config {
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Config {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .or_else(|_| env::var("PORT"))
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5000),
                environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
                body_limit: env::var("BODY_LIMIT_BYTES")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(10 * 1024 * 1024),
            },
            database: DatabaseConfig {
                host: env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("DB_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(5432),
                user: env::var("DB_USER").unwrap_or_else(|_| "postgres".to_string()),
                password: env::var("DB_PASSWORD").unwrap_or_else(|_| "postgres".to_string()),
                database: env::var("DB_NAME").unwrap_or_else(|_| "attendance".to_string()),
                ssl_mode: env::var("DB_SSL_MODE").unwrap_or_else(|_| "disable".to_string()),
                max_connections: env::var("DB_MAX_CONNS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(25),
            },
            redis: RedisConfig {
                host: env::var("REDIS_HOST").unwrap_or_else(|_| "localhost".to_string()),
                port: env::var("REDIS_PORT")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(6379),
                password: env::var("REDIS_PASSWORD").ok(),
                db: env::var("REDIS_DB")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(0),
            },
            minio: MinioConfig {
                endpoint: env::var("MINIO_ENDPOINT")
                    .unwrap_or_else(|_| "http://localhost:9000".to_string()),
                access_key: env::var("MINIO_ACCESS_KEY")
                    .unwrap_or_else(|_| "minioadmin".to_string()),
                secret_key: env::var("MINIO_SECRET_KEY")
                    .unwrap_or_else(|_| "minioadmin".to_string()),
                use_ssl: env::var("MINIO_USE_SSL")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(false),
                region: env::var("MINIO_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
                avatars_bucket: env::var("MINIO_AVATARS_BUCKET")
                    .unwrap_or_else(|_| "avatars".to_string()),
                public_url: env::var("MINIO_PUBLIC_URL").ok(),
            },
            jwt: JwtConfig {
                secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "super-secret-jwt-key-change-in-production".to_string()),
                token_ttl: Duration::from_secs(
                    env::var("JWT_TOKEN_TTL")
                        .ok()
                        .and_then(|p| p.parse().ok())
                        .unwrap_or(24 * 60 * 60), // 24 hours
                ),
                issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "smart-attendance".to_string()),
            },
            presence: PresenceConfig {
                stale_window: env::var("PRESENCE_STALE_WINDOW_SECS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(STALE_WINDOW),
            },
            relay: RelayConfig {
                backend: env::var("RFID_RELAY_BACKEND")
                    .ok()
                    .and_then(|v| RelayBackend::parse(&v))
                    .unwrap_or(RelayBackend::Memory),
                active_window: env::var("RFID_ACTIVE_WINDOW_SECS")
                    .ok()
                    .and_then(|p| p.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(ACTIVE_WINDOW),
            },
            devices: DeviceConfig {
                delete_logs: env::var("DEVICE_DELETE_LOGS")
                    .ok()
                    .and_then(|v| LogRetention::parse(&v))
                    .unwrap_or(LogRetention::Purge),
            },
            mail: MailConfig {
                from: env::var("EMAIL_USER")
                    .unwrap_or_else(|_| "no-reply@smart-attendance.local".to_string()),
            },
            seed: SeedConfig {
                admin_username: env::var("SEED_ADMIN_USERNAME")
                    .unwrap_or_else(|_| "admin".to_string()),
                admin_password: env::var("SEED_ADMIN_PASSWORD")
                    .unwrap_or_else(|_| "admin123".to_string()),
            },
        }
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}?sslmode={}",
            self.database.user,
            self.database.password,
            self.database.host,
            self.database.port,
            self.database.database,
            self.database.ssl_mode
        )
    }

    pub fn redis_url(&self) -> String {
        match &self.redis.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.redis.host, self.redis.port, self.redis.db
            ),
            None => format!(
                "redis://{}:{}/{}",
                self.redis.host, self.redis.port, self.redis.db
            ),
        }
    }

    pub fn is_development(&self) -> bool {
        self.server.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relay_backend_parses_case_insensitively() {
        assert_eq!(RelayBackend::parse("memory"), Some(RelayBackend::Memory));
        assert_eq!(RelayBackend::parse(" Redis "), Some(RelayBackend::Redis));
        assert_eq!(RelayBackend::parse("memcached"), None);
    }

    #[test]
    fn log_retention_parses_known_policies() {
        assert_eq!(LogRetention::parse("purge"), Some(LogRetention::Purge));
        assert_eq!(LogRetention::parse("DETACH"), Some(LogRetention::Detach));
        assert_eq!(LogRetention::parse("keep"), None);
    }

    #[test]
    fn redis_url_includes_password_when_set() {
        let mut config = Config::load();
        config.redis.host = "cache".to_string();
        config.redis.port = 6380;
        config.redis.db = 2;
        config.redis.password = Some("pw".to_string());
        assert_eq!(config.redis_url(), "redis://:pw@cache:6380/2");

        config.redis.password = None;
        assert_eq!(config.redis_url(), "redis://cache:6380/2");
    }
}
