//! Environment-driven settings for the hosted backend.

use std::{env, time::Duration};

use crate::error::ConfigError;

/// Table used when `SUPABASE_COMMENTS_TABLE` is unset.
pub const DEFAULT_COMMENTS_TABLE: &str = "comments";
const DEFAULT_TIMEOUT_SECONDS: u64 = 15;

/// Connection settings for the hosted row store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupabaseConfig {
    /// Project URL without trailing slash, e.g. `https://xyz.supabase.co`.
    pub url: String,
    /// Public anon key; sent as `apikey` on every request.
    pub anon_key: String,
    /// Table holding comment rows.
    pub comments_table: String,
    /// Per-request timeout, at least one second.
    pub timeout: Duration,
}

impl SupabaseConfig {
    /// Defaults for everything but the project URL and key.
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            url: url.into().trim().trim_end_matches('/').to_string(),
            anon_key: anon_key.into().trim().to_string(),
            comments_table: DEFAULT_COMMENTS_TABLE.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    /// Reads `SUPABASE_URL`, `SUPABASE_ANON_KEY`, `SUPABASE_COMMENTS_TABLE` and
    /// `SUPABASE_TIMEOUT_SECONDS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`SupabaseConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &'static str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let url = read("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                name: "SUPABASE_URL",
                reason: "must use http or https".to_string(),
            });
        }
        let anon_key = read("SUPABASE_ANON_KEY").ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let mut config = Self::new(url, anon_key);
        if let Some(table) = read("SUPABASE_COMMENTS_TABLE") {
            config.comments_table = table;
        }
        if let Some(raw) = read("SUPABASE_TIMEOUT_SECONDS") {
            let seconds = raw.parse::<u64>().map_err(|err| ConfigError::Invalid {
                name: "SUPABASE_TIMEOUT_SECONDS",
                reason: err.to_string(),
            })?;
            config.timeout = Duration::from_secs(seconds.max(1));
        }
        Ok(config)
    }
}
