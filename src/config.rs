use std::str::FromStr;

use anyhow::Context;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: String,
    pub session_idle_minutes: i64,
    pub secure_cookies: bool,
    pub max_db_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenv::dotenv();

        Ok(Self {
            database_url: var_or("DATABASE_URL", "sqlite://hushchat.db?mode=rwc"),
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:8080"),
            session_idle_minutes: parse_var("SESSION_IDLE_MINUTES", 60)?,
            secure_cookies: parse_var("SECURE_COOKIES", false)?,
            max_db_connections: parse_var("MAX_DB_CONNECTIONS", 16)?,
        })
    }

    /// Private in-memory database, one connection so every query sees it.
    pub fn for_tests() -> Self {
        Self {
            database_url: "sqlite::memory:".to_owned(),
            bind_addr: "127.0.0.1:0".to_owned(),
            session_idle_minutes: 5,
            secure_cookies: false,
            max_db_connections: 1,
        }
    }
}

fn var_or(key: &str, default: &str) -> String {
    dotenv::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match dotenv::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
