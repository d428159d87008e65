//! Runtime configuration loaded from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Secret used when `JWT_SECRET` is not set; fine for local development only
const DEV_JWT_SECRET: &str = "appbuilder-dev-secret-change-me";

/// Server configuration
///
/// All fields have defaults suitable for local development. In production,
/// override them via environment variables (a `.env` file is honoured).
#[derive(Debug, Clone)]
pub struct Config {
    /// Listen port
    pub port: u16,
    /// Path of the redb database file
    pub database_url: String,
    /// HMAC-SHA256 secret used to sign and verify tokens
    pub jwt_secret: String,
    /// Token lifetime in days
    pub jwt_expiry_days: i64,
    /// Allowed CORS origins
    pub cors_origins: Vec<String>,
    /// Settings for the AI suggestion endpoint
    pub ai: AiConfig,
}

/// Outbound AI endpoint settings
#[derive(Debug, Clone)]
pub struct AiConfig {
    /// OpenAI-compatible chat-completions URL; `None` selects the built-in catalog
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_url: None,
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 5000,
            database_url: "appbuilder.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            jwt_expiry_days: 7,
            cors_origins: vec!["http://localhost:5173".to_string()],
            ai: AiConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var           | Default                  |
    /// |-------------------|--------------------------|
    /// | `PORT`            | `5000`                   |
    /// | `DATABASE_URL`    | `appbuilder.db`          |
    /// | `JWT_SECRET`      | development secret       |
    /// | `JWT_EXPIRY_DAYS` | `7`                      |
    /// | `CORS_ORIGINS`    | `http://localhost:5173`  |
    /// | `AI_API_URL`      | unset (built-in catalog) |
    /// | `AI_API_KEY`      | unset                    |
    /// | `AI_MODEL`        | `gpt-4o-mini`            |
    /// | `AI_TIMEOUT_SECS` | `30`                     |
    ///
    /// Values that fail to parse fall back to their default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let jwt_secret = match non_empty_var("JWT_SECRET") {
            Some(secret) => secret,
            None => {
                tracing::warn!("JWT_SECRET is not set, using the development secret");
                defaults.jwt_secret
            }
        };

        let cors_origins = non_empty_var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_origins);

        let ai = AiConfig {
            api_url: non_empty_var("AI_API_URL"),
            api_key: non_empty_var("AI_API_KEY"),
            model: non_empty_var("AI_MODEL").unwrap_or(defaults.ai.model),
            timeout: Duration::from_secs(parsed_var("AI_TIMEOUT_SECS", 30)),
        };

        Self {
            port: parsed_var("PORT", defaults.port),
            database_url: non_empty_var("DATABASE_URL").unwrap_or(defaults.database_url),
            jwt_secret,
            jwt_expiry_days: parsed_var("JWT_EXPIRY_DAYS", defaults.jwt_expiry_days),
            cors_origins,
            ai,
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parsed_var<T: FromStr>(key: &str, default: T) -> T {
    match non_empty_var(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparseable value, using default");
            default
        }),
        None => default,
    }
}
