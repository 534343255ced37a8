use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

/// Lifetime of an operator session token, in seconds.
pub const TOKEN_TTL_SECS: i64 = 60 * 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Signing secret for operator tokens. Absence is reported per request as a
    /// server configuration error rather than failing startup.
    pub jwt_secret: Option<String>,
    pub api_key: Option<String>,
    pub bot_rate_limit: u32,
    pub user_rate_limit: u32,
    pub rate_limit_window_secs: u64,
    /// Empty means any origin.
    pub cors_allowed_origins: Vec<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:3000"),
            database_url: get_env("DATABASE_URL")?,
            database_max_connections: get_env_parse_or("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret: get_optional_env("JWT_SECRET"),
            api_key: get_optional_env("API_KEY"),
            bot_rate_limit: get_env_parse_or("BOT_RATE_LIMIT", 20)?,
            user_rate_limit: get_env_parse_or("USER_RATE_LIMIT", 100)?,
            rate_limit_window_secs: get_env_parse_or("RATE_LIMIT_WINDOW_SECS", 15 * 60)?,
            cors_allowed_origins: get_env_list("CORS_ALLOWED_ORIGINS"),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

// Empty values are treated as unset.
fn get_optional_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_list(name: &str) -> Vec<String> {
    get_optional_env(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
