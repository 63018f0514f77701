use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
    pub embedding: EmbeddingConfig,
    pub routes: RouteConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: u64,
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
}

/// Remote embedding endpoint settings. The service POSTs to
/// `{endpoint}/embeddings` with a bearer key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    pub dimensions: usize,
}

/// Route-protection tables. Kept as plain strings here; the guard parses
/// them into a typed table once at startup so tests can build their own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteConfig {
    /// (path prefix, minimum role) pairs, first-declared wins length ties.
    pub protected: Vec<(String, String)>,
    /// Pages meant only for unauthenticated visitors.
    pub auth_pages: Vec<String>,
    pub login_path: String,
    pub default_landing: String,
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
            self.database.acquire_timeout_secs =
                v.parse().unwrap_or(self.database.acquire_timeout_secs);
        }

        // Security overrides
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_HOURS") {
            self.security.jwt_expiry_hours = v.parse().unwrap_or(self.security.jwt_expiry_hours);
        }
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Embedding overrides
        if let Ok(v) = env::var("EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = v;
        }
        if let Ok(v) = env::var("EMBEDDING_API_KEY") {
            self.embedding.api_key = v;
        }
        if let Ok(v) = env::var("EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = env::var("EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = v.parse().unwrap_or(self.embedding.dimensions);
        }

        self
    }

    fn route_defaults() -> RouteConfig {
        RouteConfig {
            protected: vec![
                ("/admin".to_string(), "admin".to_string()),
                ("/teacher".to_string(), "teacher".to_string()),
                ("/dashboard".to_string(), "student".to_string()),
                ("/chat".to_string(), "student".to_string()),
            ],
            auth_pages: vec!["/login".to_string(), "/register".to_string()],
            login_path: "/login".to_string(),
            default_landing: "/dashboard".to_string(),
        }
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                acquire_timeout_secs: 30,
            },
            security: SecurityConfig {
                jwt_secret: "studyhall-dev-secret".to_string(),
                jwt_expiry_hours: 24 * 7, // 1 week
                enable_cors: true,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:5173".to_string(),
                ],
            },
            embedding: EmbeddingConfig {
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                model: "text-embedding-3-small".to_string(),
                dimensions: 1536,
            },
            routes: Self::route_defaults(),
        }
    }

    fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            database: DatabaseConfig {
                max_connections: 20,
                acquire_timeout_secs: 10,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 24,
                enable_cors: true,
                cors_origins: vec!["https://staging.studyhall.example.com".to_string()],
            },
            embedding: EmbeddingConfig {
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                model: "text-embedding-3-small".to_string(),
                dimensions: 1536,
            },
            routes: Self::route_defaults(),
        }
    }

    fn production() -> Self {
        Self {
            environment: Environment::Production,
            database: DatabaseConfig {
                max_connections: 50,
                acquire_timeout_secs: 5,
            },
            security: SecurityConfig {
                jwt_secret: String::new(),
                jwt_expiry_hours: 4,
                enable_cors: true,
                cors_origins: vec!["https://app.studyhall.example.com".to_string()],
            },
            embedding: EmbeddingConfig {
                endpoint: "https://api.openai.com/v1".to_string(),
                api_key: String::new(),
                model: "text-embedding-3-small".to_string(),
                dimensions: 1536,
            },
            routes: Self::route_defaults(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn development_defaults() {
        let config = AppConfig::development();
        assert!(!config.security.jwt_secret.is_empty());
        assert_eq!(config.embedding.dimensions, 1536);
        assert_eq!(config.routes.login_path, "/login");
    }

    #[test]
    fn production_requires_explicit_secret() {
        let config = AppConfig::production();
        assert!(config.security.jwt_secret.is_empty());
        assert_eq!(config.security.jwt_expiry_hours, 4);
    }

    #[test]
    fn protected_table_covers_admin_prefix() {
        let routes = AppConfig::route_defaults();
        assert!(routes
            .protected
            .iter()
            .any(|(prefix, role)| prefix == "/admin" && role == "admin"));
    }
}
