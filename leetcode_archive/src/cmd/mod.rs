pub mod crawl;
pub mod login;

use crate::modules::{
    auth::CookieCache,
    extractor::{CodeExtractor, PatternExtractor, ScriptExtractor},
    migration::MIGRATOR,
};
use anyhow::{Context, Result};
use clap::ValueEnum;
use sqlx::{
    sqlite::{Sqlite, SqliteConnectOptions, SqlitePoolOptions},
    Pool,
};
use std::{env, fmt, str::FromStr};

pub const DEFAULT_BASE_URL: &str = "https://leetcode.com";
pub const DEFAULT_COOKIE_PATH: &str = "./cookies.json";

#[derive(Debug, ValueEnum, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// Match the code literal anywhere in the page
    Pattern,
    /// Match the code literal inside `<script>` elements only
    Script,
}

impl ExtractorKind {
    pub fn extractor(&self) -> Box<dyn CodeExtractor> {
        match self {
            ExtractorKind::Pattern => Box::new(PatternExtractor),
            ExtractorKind::Script => Box::new(ScriptExtractor),
        }
    }
}

impl fmt::Display for ExtractorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractorKind::Pattern => write!(f, "pattern"),
            ExtractorKind::Script => write!(f, "script"),
        }
    }
}

pub fn base_url() -> String {
    env::var("LEETCODE_BASE_URL").unwrap_or(String::from(DEFAULT_BASE_URL))
}

pub fn login_url() -> Result<String> {
    let url = url::Url::parse(&base_url())
        .and_then(|base| base.join("/accounts/login/"))
        .context("LEETCODE_BASE_URL is not a valid url.")?;
    Ok(url.to_string())
}

pub fn cookie_cache() -> CookieCache {
    CookieCache::new(env::var("LEETCODE_COOKIE_PATH").unwrap_or(String::from(DEFAULT_COOKIE_PATH)))
}

/// Opens the archive database, creating the file and tables when missing.
pub async fn connect_database() -> Result<Pool<Sqlite>> {
    let database_url: String = env::var("DATABASE_URL").with_context(|| {
        let message = "DATABASE_URL must be configured.";
        tracing::error!(message);
        message
    })?;

    let options = SqliteConnectOptions::from_str(&database_url)
        .with_context(|| format!("Invalid DATABASE_URL: {}", database_url))?
        .create_if_missing(true);
    let pool: Pool<Sqlite> = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .with_context(|| {
            let message = "Failed to create database connection pool.";
            tracing::error!(message);
            message
        })?;

    MIGRATOR.run(&pool).await.with_context(|| {
        let message = "Failed to migrate the archive tables.";
        tracing::error!(message);
        message
    })?;

    Ok(pool)
}
