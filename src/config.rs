//! Configuration management for Folio.
//!
//! Loads configuration from environment variables (optionally via a `.env`
//! file). Backend connection settings are supplied at start time; nothing is
//! read from disk after startup.

use std::env;
use std::sync::OnceLock;

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub forms: FormsConfig,
    pub live: LiveConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub public_url: String,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub max_age_seconds: u64,
    /// How often expired sessions are purged.
    pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Passwords shorter than this are rejected as weak.
    pub min_password_length: usize,
    /// PBKDF2 iteration count for new password hashes.
    pub password_iterations: u32,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub blobs_path: String,
    /// Base URL blob paths are resolved against (default: `{PUBLIC_URL}/blobs`)
    pub blobs_public_url: String,
    pub max_upload_size: usize,
}

#[derive(Debug, Clone)]
pub struct FormsConfig {
    /// Lifetime of the transient success/error notice shown after a submit.
    pub notice_ttl_ms: u64,
}

#[derive(Debug, Clone)]
pub struct LiveConfig {
    pub keepalive_seconds: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let public_url = env_or("PUBLIC_URL", "http://localhost:8765");
        let blobs_public_url = env::var("BLOBS_PUBLIC_URL")
            .unwrap_or_else(|_| format!("{}/blobs", public_url.trim_end_matches('/')));

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8765").parse().unwrap_or(8765),
                public_url,
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/folio.db"),
            },
            session: SessionConfig {
                max_age_seconds: env_or("SESSION_MAX_AGE", "604800")
                    .parse()
                    .unwrap_or(604800), // 7 days
                cleanup_interval_seconds: env_or("SESSION_CLEANUP_INTERVAL_SECS", "3600")
                    .parse()
                    .unwrap_or(3600),
            },
            auth: AuthConfig {
                min_password_length: env_or("MIN_PASSWORD_LENGTH", "6").parse().unwrap_or(6),
                password_iterations: env_or("PASSWORD_ITERATIONS", "100000")
                    .parse()
                    .unwrap_or(100_000),
            },
            storage: StorageConfig {
                blobs_path: env_or("BLOBS_PATH", "./data/blobs"),
                blobs_public_url,
                max_upload_size: env_or("MAX_UPLOAD_SIZE", "10485760")
                    .parse()
                    .unwrap_or(10 * 1024 * 1024), // 10MB
            },
            forms: FormsConfig {
                notice_ttl_ms: env_or("NOTICE_TTL_MS", "3000").parse().unwrap_or(3000),
            },
            live: LiveConfig {
                keepalive_seconds: env_or("LIVE_KEEPALIVE_SECS", "30").parse().unwrap_or(30),
            },
        }
    }

    /// Configuration for tests: in-memory database, cheap password hashing.
    pub fn for_tests(blobs_path: &str) -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                public_url: "http://localhost:8765".to_string(),
            },
            database: DatabaseConfig {
                path: ":memory:".to_string(),
            },
            session: SessionConfig {
                max_age_seconds: 3600,
                cleanup_interval_seconds: 3600,
            },
            auth: AuthConfig {
                min_password_length: 6,
                password_iterations: 1_000,
            },
            storage: StorageConfig {
                blobs_path: blobs_path.to_string(),
                blobs_public_url: "http://localhost:8765/blobs".to_string(),
                max_upload_size: 1024 * 1024,
            },
            forms: FormsConfig { notice_ttl_ms: 3000 },
            live: LiveConfig {
                keepalive_seconds: 30,
            },
        }
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.server.public_url.starts_with("https")
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_for_tests_uses_memory_database() {
        let config = Config::for_tests("/tmp/blobs");
        assert_eq!(config.database.path, ":memory:");
        assert_eq!(config.forms.notice_ttl_ms, 3000);
        assert!(!config.secure_cookies());
    }

    #[test]
    fn test_secure_cookies_follow_public_url() {
        let mut config = Config::for_tests("/tmp/blobs");
        config.server.public_url = "https://folio.example".to_string();
        assert!(config.secure_cookies());
    }
}
