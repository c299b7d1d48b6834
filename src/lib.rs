//! Lua Code Bot Library
//!
//! A Discord bot with a single `!code <prompt>` command. The prompt goes to
//! Google Gemini together with a fixed system instruction that restricts the
//! answer to one ```lua``` block, and the answer is posted back to the
//! channel.

pub mod bot;
pub mod codegen;
pub mod config;
pub mod error;
pub mod integrations;
pub mod metrics;
pub mod prompts;

#[cfg(test)]
mod test_support;

// Re-export common types
pub use codegen::{CodeReply, ContentGenerator};
pub use config::Config;
pub use error::{Error, Result};
pub use integrations::GeminiClient;
