//! Configuration for the Discord and Gemini clients
//!
//! Secrets come from the process environment, optionally seeded from a
//! `.env` file in the working directory. Everything else is a constant.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable holding the Discord bot token.
pub const DISCORD_TOKEN_ENV: &str = "DISCORD_TOKEN";
/// Environment variable holding the Gemini API key.
pub const GEMINI_API_KEY_ENV: &str = "GEMINI_API_KEY";
/// Default env file, resolved against the working directory.
pub const ENV_FILE: &str = ".env";

pub const MODEL_NAME: &str = "gemini-2.5-flash";
pub const TEMPERATURE: f32 = 0.2;
pub const COMMAND_PREFIX: &str = "!";
pub const COMMAND_NAME: &str = "code";
/// Activity label shown next to the bot account.
pub const PRESENCE: &str = "Generating Lua | !code";

/// Result of looking for the optional env file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFile {
    /// File existed and its entries were merged into the environment.
    Loaded(PathBuf),
    /// No file at the path; the environment is used as-is.
    Missing(PathBuf),
}

/// Merge entries from an env file into the process environment.
///
/// Variables that are already set keep their values. A missing file is not
/// an error.
pub fn load_env_file(path: &Path) -> Result<EnvFile> {
    if !path.exists() {
        return Ok(EnvFile::Missing(path.to_path_buf()));
    }

    dotenvy::from_path(path)?;
    Ok(EnvFile::Loaded(path.to_path_buf()))
}

/// Runtime secrets.
#[derive(Clone)]
pub struct Config {
    discord_token: Option<String>,
    gemini_api_key: String,
}

impl Config {
    /// Read secrets from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read secrets through an arbitrary lookup function.
    ///
    /// A missing or blank Gemini key fails immediately. An unset or empty
    /// Discord token is recorded and only checked when the bot starts; any
    /// other value is handed to the Discord login as-is.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let gemini_api_key = lookup(GEMINI_API_KEY_ENV)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| {
                Error::MissingConfig(format!(
                    "{} is missing or empty. Please populate your .env file.",
                    GEMINI_API_KEY_ENV
                ))
            })?;

        Ok(Self {
            discord_token: lookup(DISCORD_TOKEN_ENV).filter(|v| !v.is_empty()),
            gemini_api_key,
        })
    }

    pub fn discord_token(&self) -> Option<&str> {
        self.discord_token.as_deref()
    }

    pub fn gemini_api_key(&self) -> &str {
        &self.gemini_api_key
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field(
                "discord_token",
                &self.discord_token.as_ref().map(|_| "<redacted>"),
            )
            .field("gemini_api_key", &"<redacted>")
            .finish()
    }
}
