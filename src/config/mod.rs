use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
    pub enable_slow_query_warning: bool,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub cors_origins: Vec<String>,
    pub require_https: bool,
    pub enable_audit_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub access_token_ttl_secs: u64,
    pub refresh_token_ttl_days: i64,
    pub max_refresh_tokens_per_user: i64,
    pub auth_code_ttl_secs: i64,
}

/// Fixed-window admission policies, all keyed by client IP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub global_per_minute: u32,
    pub api_per_minute: u32,
    pub auth_per_minute: u32,
    pub external_auth_per_minute: u32,
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
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_ACQUIRE_TIMEOUT_SECS") {
            self.database.acquire_timeout_secs = v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }
        if let Ok(v) = env::var("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Ok(v) = env::var("SECURITY_REQUIRE_HTTPS") {
            self.security.require_https = v.parse().unwrap_or(self.security.require_https);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_AUDIT_LOGGING") {
            self.security.enable_audit_logging = v.parse().unwrap_or(self.security.enable_audit_logging);
        }

        // Token policy overrides
        if let Ok(v) = env::var("AUTH_ACCESS_TOKEN_TTL_SECS") {
            self.auth.access_token_ttl_secs = v.parse().unwrap_or(self.auth.access_token_ttl_secs);
        }
        if let Ok(v) = env::var("AUTH_REFRESH_TOKEN_TTL_DAYS") {
            self.auth.refresh_token_ttl_days = v.parse().unwrap_or(self.auth.refresh_token_ttl_days);
        }
        if let Ok(v) = env::var("AUTH_MAX_REFRESH_TOKENS_PER_USER") {
            self.auth.max_refresh_tokens_per_user = v.parse().unwrap_or(self.auth.max_refresh_tokens_per_user);
        }

        // Rate limit overrides
        if let Ok(v) = env::var("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = v.parse().unwrap_or(self.rate_limit.enabled);
        }
        if let Ok(v) = env::var("RATE_LIMIT_GLOBAL_PER_MINUTE") {
            self.rate_limit.global_per_minute = v.parse().unwrap_or(self.rate_limit.global_per_minute);
        }
        if let Ok(v) = env::var("RATE_LIMIT_API_PER_MINUTE") {
            self.rate_limit.api_per_minute = v.parse().unwrap_or(self.rate_limit.api_per_minute);
        }
        if let Ok(v) = env::var("RATE_LIMIT_AUTH_PER_MINUTE") {
            self.rate_limit.auth_per_minute = v.parse().unwrap_or(self.rate_limit.auth_per_minute);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                acquire_timeout_secs: 3,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 100,
            },
            security: SecurityConfig {
                jwt_secret: "dev-secret-change-me".to_string(),
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
                require_https: false,
                enable_audit_logging: false,
            },
            auth: AuthConfig {
                access_token_ttl_secs: 3600,
                refresh_token_ttl_days: 7,
                max_refresh_tokens_per_user: 3,
                auth_code_ttl_secs: 600,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                global_per_minute: 100,
                api_per_minute: 60,
                auth_per_minute: 10,
                external_auth_per_minute: 20,
            },
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                acquire_timeout_secs: 10,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 500,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                cors_origins: vec!["https://staging.example.com".to_string()],
                require_https: true,
                enable_audit_logging: true,
            },
            auth: AuthConfig {
                access_token_ttl_secs: 3600,
                refresh_token_ttl_days: 7,
                max_refresh_tokens_per_user: 3,
                auth_code_ttl_secs: 600,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                global_per_minute: 100,
                api_per_minute: 60,
                auth_per_minute: 10,
                external_auth_per_minute: 20,
            },
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                acquire_timeout_secs: 5,
                enable_slow_query_warning: true,
                slow_query_threshold_ms: 1000,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                cors_origins: vec!["https://app.example.com".to_string()],
                require_https: true,
                enable_audit_logging: true,
            },
            auth: AuthConfig {
                access_token_ttl_secs: 3600,
                refresh_token_ttl_days: 7,
                max_refresh_tokens_per_user: 3,
                auth_code_ttl_secs: 600,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                global_per_minute: 100,
                api_per_minute: 60,
                auth_per_minute: 10,
                external_auth_per_minute: 20,
            },
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Development)
    };
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
        assert!(!config.security.require_https);
        assert_eq!(config.auth.access_token_ttl_secs, 3600);
        assert_eq!(config.auth.max_refresh_tokens_per_user, 3);
        assert!(!config.security.jwt_secret.is_empty());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert!(config.security.require_https);
        assert!(config.security.enable_audit_logging);
        assert_eq!(config.rate_limit.global_per_minute, 100);
        assert_eq!(config.rate_limit.auth_per_minute, 10);
    }

    #[test]
    fn test_rate_limit_policy_table_is_complete() {
        let config = AppConfig::development();
        assert_eq!(config.rate_limit.api_per_minute, 60);
        assert_eq!(config.rate_limit.external_auth_per_minute, 20);
    }
}
