use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use ouramind_core::cipher::{CipherError, EntryCipher};
use ouramind_core::emotion::{DEFAULT_LIMIT, DEFAULT_THRESHOLD};
use ouramind_nlu::{NluConfig, DEFAULT_API_VERSION};

use crate::journal::JournalSettings;

/// Default classifier timeout, in seconds.
pub const DEFAULT_CLASSIFY_TIMEOUT_SECS: u64 = 10;

/// Failure to load [`PipelineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {message}")]
    Invalid { var: &'static str, message: String },

    #[error("ENCRYPTION_KEY is unusable: {0}")]
    Key(#[from] CipherError),
}

/// Pipeline configuration loaded from environment variables.
#[derive(Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    /// Cipher built from `ENCRYPTION_KEY`. An unusable key fails loading.
    pub cipher: EntryCipher,
    pub nlu: NluConfig,
    pub journal: JournalSettings,
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("database_url", &"<redacted>")
            .field("db_max_connections", &self.db_max_connections)
            .field("cipher", &self.cipher)
            .field("nlu", &self.nlu)
            .field("journal", &self.journal)
            .finish()
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default      |
    /// |-------------------------|--------------|
    /// | `DATABASE_URL`          | required     |
    /// | `ENCRYPTION_KEY`        | required     |
    /// | `NLU_API_URL`           | required     |
    /// | `NLU_API_KEY`           | required     |
    /// | `NLU_API_VERSION`       | `2022-04-07` |
    /// | `CLASSIFY_TIMEOUT_SECS` | `10`         |
    /// | `EMOTION_THRESHOLD`     | `0.3`        |
    /// | `EMOTION_LIMIT`         | `2`          |
    /// | `DB_MAX_CONNECTIONS`    | `10`         |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(var))
        };

        let database_url = required("DATABASE_URL")?;
        let cipher = EntryCipher::from_key_material(required("ENCRYPTION_KEY")?.trim())?;

        let classify_timeout_secs: u64 =
            parse_or(&lookup, "CLASSIFY_TIMEOUT_SECS", DEFAULT_CLASSIFY_TIMEOUT_SECS)?;
        if classify_timeout_secs == 0 {
            return Err(invalid("CLASSIFY_TIMEOUT_SECS", "must be at least 1"));
        }
        let classify_timeout = Duration::from_secs(classify_timeout_secs);

        let emotion_threshold: f64 = parse_or(&lookup, "EMOTION_THRESHOLD", DEFAULT_THRESHOLD)?;
        if !(0.0..=1.0).contains(&emotion_threshold) {
            return Err(invalid("EMOTION_THRESHOLD", "must be between 0 and 1"));
        }

        let emotion_limit: usize = parse_or(&lookup, "EMOTION_LIMIT", DEFAULT_LIMIT)?;
        if emotion_limit == 0 {
            return Err(invalid("EMOTION_LIMIT", "must be at least 1"));
        }

        let db_max_connections: u32 =
            parse_or(&lookup, "DB_MAX_CONNECTIONS", ouramind_db::DEFAULT_MAX_CONNECTIONS)?;
        if db_max_connections == 0 {
            return Err(invalid("DB_MAX_CONNECTIONS", "must be at least 1"));
        }

        let nlu = NluConfig {
            api_url: required("NLU_API_URL")?,
            api_key: required("NLU_API_KEY")?,
            api_version: lookup("NLU_API_VERSION")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_API_VERSION.into()),
            request_timeout: classify_timeout,
        };

        Ok(Self {
            database_url,
            db_max_connections,
            cipher,
            nlu,
            journal: JournalSettings {
                classify_timeout,
                emotion_threshold,
                emotion_limit,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(var, e.to_string())),
    }
}

fn invalid(var: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        var,
        message: message.into(),
    }
}
