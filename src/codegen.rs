//! `!code` request handling, independent of Discord.
//!
//! Builds the Gemini request for a prompt, runs it through a
//! [`ContentGenerator`] and turns the outcome into chat text. Each call owns
//! its request and reply; nothing is shared between invocations.

use std::future::Future;
use std::time::Instant;

use tracing::{error, info};

use crate::config::{COMMAND_NAME, TEMPERATURE};
use crate::integrations::gemini::{
    Content, GenerateContentRequest, GenerationConfig, SystemInstruction,
};
use crate::metrics::{self, Outcome};
use crate::prompts::{self, API_ERROR_NOTICE, EMPTY_RESPONSE_NOTICE, SYSTEM_INSTRUCTION};
use crate::Result;

/// Discord's hard limit on message length, in characters.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Anything that can answer a `generateContent` request.
pub trait ContentGenerator: Send + Sync {
    /// `Ok(None)` means the provider answered without any text.
    fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Request for a single `!code` invocation.
pub fn build_request(prompt: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user(prompts::user_request(prompt))],
        system_instruction: Some(SystemInstruction::text(SYSTEM_INSTRUCTION)),
        generation_config: Some(GenerationConfig {
            temperature: TEMPERATURE,
            max_output_tokens: None,
        }),
    }
}

/// What a `!code` invocation ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeReply {
    Generated { prompt: String, text: String },
    Empty,
    /// Raw provider error. Only the generic notice reaches the channel.
    Failed(String),
}

impl CodeReply {
    /// Text to post in the originating channel.
    pub fn message(&self) -> String {
        match self {
            CodeReply::Generated { prompt, text } => prompts::generated_reply(prompt, text),
            CodeReply::Empty => EMPTY_RESPONSE_NOTICE.to_string(),
            CodeReply::Failed(_) => API_ERROR_NOTICE.to_string(),
        }
    }

    fn outcome(&self) -> Outcome {
        match self {
            CodeReply::Generated { .. } => Outcome::Ok,
            CodeReply::Empty => Outcome::Empty,
            CodeReply::Failed(_) => Outcome::Error,
        }
    }
}

/// Generate Lua code for `prompt`.
///
/// Never fails: provider errors of any kind are logged and collapsed into
/// [`CodeReply::Failed`].
pub async fn respond<G: ContentGenerator>(generator: &G, prompt: &str) -> CodeReply {
    metrics::record_generation_start(COMMAND_NAME);
    let start = Instant::now();

    let request = build_request(prompt);
    let reply = match generator.generate_content(&request).await {
        Ok(Some(text)) if !text.is_empty() => CodeReply::Generated {
            prompt: prompt.to_string(),
            text,
        },
        Ok(_) => CodeReply::Empty,
        Err(err) => {
            error!("Gemini API Error: {}", err);
            CodeReply::Failed(err.to_string())
        }
    };

    let outcome = reply.outcome();
    metrics::record_generation_result(COMMAND_NAME, start.elapsed(), outcome);
    info!(
        prompt_len = prompt.len(),
        outcome = outcome.as_str(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Code request finished"
    );

    reply
}

/// Split `text` into chunks of at most `limit` characters.
///
/// Splits after a newline when one fits in the chunk, otherwise at the limit.
/// Joining the chunks gives back `text` exactly.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    let mut chunks = Vec::new();
    let mut rest = text;

    while rest.chars().count() > limit {
        // Byte offset just past the `limit`-th char.
        let hard_end = rest
            .char_indices()
            .nth(limit)
            .map(|(idx, _)| idx)
            .unwrap_or(rest.len());

        let end = match rest[..hard_end].rfind('\n') {
            Some(newline) if newline > 0 => newline + 1,
            _ => hard_end,
        };

        chunks.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    if !rest.is_empty() || chunks.is_empty() {
        chunks.push(rest.to_string());
    }

    chunks
}
