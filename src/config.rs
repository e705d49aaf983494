use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

/// Default lifetime of a login token: seven days.
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 10080;
/// Upper bound for `JWT_TTL_MINUTES`: one year.
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub key_path: PathBuf,
    pub issuer: String,
    pub ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt = JwtConfig {
            key_path: std::env::var("JWT_KEY_PATH")
                .context("JWT_KEY_PATH is not set")?
                .into(),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "blog-api".into()),
            ttl_minutes: parse_ttl_minutes(std::env::var("JWT_TTL_MINUTES").ok().as_deref())?,
        };
        Ok(Self { database_url, jwt })
    }
}

/// Unset means the default; anything set must be a whole number of minutes
/// in `1..=MAX_TOKEN_TTL_MINUTES`.
fn parse_ttl_minutes(raw: Option<&str>) -> anyhow::Result<i64> {
    let Some(raw) = raw else {
        return Ok(DEFAULT_TOKEN_TTL_MINUTES);
    };
    let minutes: i64 = raw
        .trim()
        .parse()
        .with_context(|| format!("JWT_TTL_MINUTES is not a number: {raw:?}"))?;
    if !(1..=MAX_TOKEN_TTL_MINUTES).contains(&minutes) {
        anyhow::bail!("JWT_TTL_MINUTES must be between 1 and {MAX_TOKEN_TTL_MINUTES}, got {minutes}");
    }
    Ok(minutes)
}
