//! External integrations module.
//!
//! Provides the Google Gemini client used for code generation.

pub mod gemini;

pub use gemini::GeminiClient;
