use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub pagination: PaginationConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_page: u32,
    pub default_size: u32,
    pub max_size: u32,
    /// Same syntax as the `sort` query parameter, e.g. "amount,asc"
    pub default_sort: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// When unset the server falls back to the in-memory store
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub seed_demo_data: bool,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub realm: String,
    pub required_role: Option<String>,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub users: Vec<UserEntry>,
}

/// A configured login for the in-memory identity provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntry {
    pub name: String,
    pub password: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid user entry '{0}', expected name:password[:ROLE|ROLE]")]
    InvalidUserEntry(String),
}

impl UserEntry {
    pub fn new(name: &str, password: &str, roles: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            password: password.to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    /// Parse a comma separated list like `sarah1:abc123:CARD-OWNER,hank:qrs456:NON-OWNER`
    pub fn parse_list(raw: &str) -> Result<Vec<UserEntry>, ConfigError> {
        let mut out = Vec::new();
        for part in raw.split(',') {
            let trimmed = part.trim();
            if trimmed.is_empty() {
                continue;
            }
            let mut fields = trimmed.splitn(3, ':');
            let name = fields.next().unwrap_or_default().trim();
            let password = fields
                .next()
                .ok_or_else(|| ConfigError::InvalidUserEntry(trimmed.to_string()))?;
            if name.is_empty() || password.is_empty() {
                return Err(ConfigError::InvalidUserEntry(trimmed.to_string()));
            }
            let roles = fields
                .next()
                .map(|r| {
                    r.split('|')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_default();
            out.push(UserEntry {
                name: name.to_string(),
                password: password.to_string(),
                roles,
            });
        }
        Ok(out)
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = env::var("CASHCARD_PORT").ok().or_else(|| env::var("PORT").ok()) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        // Pagination overrides
        if let Ok(v) = env::var("PAGINATION_DEFAULT_SIZE") {
            self.pagination.default_size = v.parse().unwrap_or(self.pagination.default_size);
        }
        if let Ok(v) = env::var("PAGINATION_MAX_SIZE") {
            self.pagination.max_size = v.parse().unwrap_or(self.pagination.max_size);
        }
        if let Ok(v) = env::var("PAGINATION_DEFAULT_SORT") {
            self.pagination.default_sort = v;
        }

        // Database overrides
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_SEED_DEMO_DATA") {
            self.database.seed_demo_data = v.parse().unwrap_or(self.database.seed_demo_data);
        }
        if let Ok(v) = env::var("DATABASE_ENABLE_SLOW_QUERY_WARNING") {
            self.database.enable_slow_query_warning = v.parse().unwrap_or(self.database.enable_slow_query_warning);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_REALM") {
            self.security.realm = v;
        }
        if let Ok(v) = env::var("SECURITY_REQUIRED_ROLE") {
            // An empty value switches role enforcement off
            self.security.required_role = Some(v.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect();
        }
        if let Ok(v) = env::var("SECURITY_USERS") {
            match UserEntry::parse_list(&v) {
                Ok(users) => self.security.users = users,
                Err(e) => tracing::warn!("Ignoring SECURITY_USERS: {}", e),
            }
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            pagination: PaginationConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 5,
                connection_timeout: 30,
                seed_demo_data: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            api: ApiConfig {
                max_request_size_bytes: 1024 * 1024, // 1MB
            },
            security: SecurityConfig {
                realm: "cashcards".to_string(),
                required_role: Some("CARD-OWNER".to_string()),
                enable_cors: true,
                cors_origins: vec![],
                users: demo_users(),
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            pagination: PaginationConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 20,
                connection_timeout: 10,
                seed_demo_data: true,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            api: ApiConfig {
                max_request_size_bytes: 256 * 1024,
            },
            security: SecurityConfig {
                realm: "cashcards".to_string(),
                required_role: Some("CARD-OWNER".to_string()),
                enable_cors: true,
                cors_origins: vec!["https://staging.example.com".to_string()],
                users: demo_users(),
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            pagination: PaginationConfig::default(),
            database: DatabaseConfig {
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                seed_demo_data: false,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            api: ApiConfig {
                max_request_size_bytes: 64 * 1024,
            },
            security: SecurityConfig {
                realm: "cashcards".to_string(),
                required_role: Some("CARD-OWNER".to_string()),
                enable_cors: true,
                cors_origins: vec!["https://app.example.com".to_string()],
                // Production logins must come from SECURITY_USERS
                users: vec![],
            },
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_page: 0,
            default_size: 20,
            max_size: 2000,
            default_sort: "amount,asc".to_string(),
        }
    }
}

fn demo_users() -> Vec<UserEntry> {
    vec![
        UserEntry::new("sarah1", "abc123", &["CARD-OWNER"]),
        UserEntry::new("hank-owns-no-cards", "qrs456", &["NON-OWNER"]),
        UserEntry::new("kumar2", "xyz789", &["CARD-OWNER"]),
    ]
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.pagination.default_page, 0);
        assert_eq!(config.pagination.default_size, 20);
        assert_eq!(config.pagination.default_sort, "amount,asc");
        assert!(config.database.seed_demo_data);
        assert_eq!(config.security.users.len(), 3);
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(!config.database.seed_demo_data);
        assert!(config.security.users.is_empty());
        assert_eq!(config.security.required_role.as_deref(), Some("CARD-OWNER"));
    }

    #[test]
    fn parses_user_list() {
        let users = UserEntry::parse_list("sarah1:abc123:CARD-OWNER, kumar2:xyz789:CARD-OWNER|AUDITOR, anon:pw").unwrap();
        assert_eq!(users.len(), 3);
        assert_eq!(users[0], UserEntry::new("sarah1", "abc123", &["CARD-OWNER"]));
        assert_eq!(users[1].roles, vec!["CARD-OWNER".to_string(), "AUDITOR".to_string()]);
        assert!(users[2].roles.is_empty());
    }

    #[test]
    fn rejects_user_without_password() {
        assert_eq!(
            UserEntry::parse_list("sarah1"),
            Err(ConfigError::InvalidUserEntry("sarah1".to_string()))
        );
        assert!(UserEntry::parse_list(":pw").is_err());
    }
}
