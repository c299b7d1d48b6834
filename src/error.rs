//! Error types for the Lua code bot

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Missing configuration: {0}")]
    MissingConfig(String),

    #[error("Env file error: {0}")]
    EnvFileError(String),

    #[error("Gemini API error: {0}")]
    GeminiError(String),

    #[error("Discord error: {0}")]
    DiscordError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<dotenvy::Error> for Error {
    fn from(err: dotenvy::Error) -> Self {
        Error::EnvFileError(err.to_string())
    }
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(err: poise::serenity_prelude::Error) -> Self {
        Error::DiscordError(err.to_string())
    }
}
