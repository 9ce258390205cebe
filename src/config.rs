use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:4173,http://localhost:5174";
pub const DEFAULT_AI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_AI_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(var) => write!(f, "{} must be set", var),
            ConfigError::Invalid { var, value } => {
                write!(f, "{} has an invalid value: {:?}", var, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Runtime configuration, read from the process environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    /// Lifetime of issued access tokens, in minutes.
    pub token_ttl_minutes: i64,
    pub bcrypt_cost: u32,
    pub server_host: String,
    pub server_port: u16,
    pub cors_allowed_origins: Vec<String>,
    /// Credential for the AI chat service. Chat is disabled when absent.
    pub ai_api_key: Option<String>,
    pub ai_api_url: String,
    pub ai_model: String,
    pub upload_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds a config from an arbitrary variable source. `from_env` is the
    /// production entry point; tests pass a map instead of mutating the environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let token_ttl_minutes = parse_or(&lookup, "ACCESS_TOKEN_EXPIRE_MINUTES", DEFAULT_TOKEN_TTL_MINUTES)?;
        let representable = chrono::Duration::try_minutes(token_ttl_minutes)
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
            .is_some();
        if token_ttl_minutes <= 0 || !representable {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: token_ttl_minutes.to_string(),
            });
        }

        let bcrypt_cost = parse_or(&lookup, "BCRYPT_COST", bcrypt::DEFAULT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                var: "BCRYPT_COST",
                value: bcrypt_cost.to_string(),
            });
        }

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: required("JWT_SECRET")?,
            token_ttl_minutes,
            bcrypt_cost,
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&lookup, "SERVER_PORT", 8000)?,
            cors_allowed_origins,
            ai_api_key: lookup("AI_API_KEY").filter(|key| !key.trim().is_empty()),
            ai_api_url: lookup("AI_API_URL").unwrap_or_else(|| DEFAULT_AI_API_URL.to_string()),
            ai_model: lookup("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            upload_dir: lookup("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}
