//! Google Gemini API client.
//!
//! Only `generateContent` is used: one user turn, a system instruction and a
//! sampling temperature.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codegen::ContentGenerator;
use crate::{Error, Result};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Google Gemini client.
///
/// Built once at startup and shared by every command invocation; the inner
/// `reqwest::Client` pools connections on its own.
#[derive(Clone)]
pub struct GeminiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a client bound to an API key and model.
    pub fn new<S: Into<String>>(api_key: S, model: &str) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::InvalidArgument("Gemini API key is empty".to_string()));
        }

        let http = Client::builder()
            .user_agent(concat!("lua_code_bot/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::InvalidArgument(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            api_key,
            base_url: GEMINI_API_URL.to_string(),
            model: model.to_string(),
        })
    }

    /// Point the client at another endpoint root (mock servers, proxies).
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Call `models/{model}:generateContent`.
    ///
    /// Returns the concatenated text of the first candidate, or `None` when
    /// the model produced no text (blocked prompt, empty candidate list).
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<Option<String>> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let response = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::GeminiError(format!("request failed: {}", e.without_url())))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::GeminiError(format!("failed to read response: {}", e.without_url())))?;

        if !status.is_success() {
            return Err(Error::GeminiError(format!(
                "{}: {}",
                status,
                error_message(&body)
            )));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| Error::GeminiError(format!("invalid response: {} - {}", e, body)))?;

        let text = parsed.text();
        debug!(
            model = %self.model,
            has_text = text.is_some(),
            "Gemini response received"
        );
        Ok(text)
    }
}

impl ContentGenerator for GeminiClient {
    async fn generate_content(&self, request: &GenerateContentRequest) -> Result<Option<String>> {
        GeminiClient::generate_content(self, request).await
    }
}

/// Pull `error.message` out of Gemini's error envelope, falling back to the
/// raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| match envelope.error.status {
            Some(status) => format!("{} ({})", envelope.error.message, status),
            None => envelope.error.message,
        })
        .unwrap_or_else(|_| body.to_string())
}

// === Request ===

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<SystemInstruction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user<S: Into<String>>(text: S) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Part {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemInstruction {
    pub parts: Vec<Part>,
}

impl SystemInstruction {
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_output_tokens: Option<u32>,
}

// === Response ===

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String = parts
            .iter()
            .filter(|p| !p.thought)
            .filter_map(|p| p.text.as_deref())
            .collect();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    const PATH: &str = "/models/gemini-2.5-flash:generateContent";

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new("test-key", "gemini-2.5-flash")
            .expect("client")
            .with_base_url(server.base_url())
    }

    fn request() -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content::user("User Request: print a table")],
            system_instruction: Some(SystemInstruction::text("only lua")),
            generation_config: Some(GenerationConfig {
                temperature: 0.2,
                max_output_tokens: None,
            }),
        }
    }

    #[test]
    fn test_new_rejects_empty_key() {
        let err = GeminiClient::new("   ", "gemini-2.5-flash").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = GeminiClient::new("secret-key", "gemini-2.5-flash").unwrap();
        assert!(!format!("{:?}", client).contains("secret-key"));
    }

    #[test]
    fn request_serializes_in_gemini_shape() {
        let value = serde_json::to_value(request()).unwrap();

        assert_eq!(
            value["contents"],
            json!([{ "role": "user", "parts": [{ "text": "User Request: print a table" }] }])
        );
        assert_eq!(value["systemInstruction"], json!({ "parts": [{ "text": "only lua" }] }));
        let temperature = value["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.2).abs() < 1e-6);
        assert!(value["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[tokio::test]
    async fn generate_content_returns_candidate_text() {
        let server = MockServer::start_async().await;

        let generate_mock = server.mock(|when, then| {
            when.method(POST)
                .path(PATH)
                .header("x-goog-api-key", "test-key")
                .is_true(|req| {
                    let body = String::from_utf8_lossy(req.body().as_ref());
                    body.contains("User Request: print a table")
                        && body.contains("systemInstruction")
                });
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "role": "model",
                        "parts": [{ "text": "```lua\nprint(1)\n```" }]
                    }
                }]
            }));
        });

        let text = client(&server).generate_content(&request()).await.unwrap();

        assert_eq!(text.as_deref(), Some("```lua\nprint(1)\n```"));
        generate_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn generate_content_joins_parts_and_skips_thoughts() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(json!({
                "candidates": [{
                    "content": {
                        "parts": [
                            { "text": "thinking...", "thought": true },
                            { "text": "```lua\n" },
                            { "text": "return {}\n```" }
                        ]
                    }
                }]
            }));
        });

        let text = client(&server).generate_content(&request()).await.unwrap();
        assert_eq!(text.as_deref(), Some("```lua\nreturn {}\n```"));
    }

    #[tokio::test]
    async fn generate_content_without_candidates_is_none() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(json!({
                "promptFeedback": { "blockReason": "SAFETY" }
            }));
        });

        let text = client(&server).generate_content(&request()).await.unwrap();
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn generate_content_with_empty_text_is_none() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).json_body(json!({
                "candidates": [{ "content": { "parts": [{ "text": "" }] }, "finishReason": "STOP" }]
            }));
        });

        let text = client(&server).generate_content(&request()).await.unwrap();
        assert!(text.is_none());
    }

    #[tokio::test]
    async fn generate_content_reports_error_envelope() {
        let server = MockServer::start_async().await;

        let generate_mock = server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(429).json_body(json!({
                "error": {
                    "code": 429,
                    "message": "Resource has been exhausted",
                    "status": "RESOURCE_EXHAUSTED"
                }
            }));
        });

        let err = client(&server)
            .generate_content(&request())
            .await
            .unwrap_err();

        let msg = format!("{err}");
        assert!(msg.contains("429"));
        assert!(msg.contains("Resource has been exhausted"));
        assert!(msg.contains("RESOURCE_EXHAUSTED"));
        generate_mock.assert_calls(1);
    }

    #[tokio::test]
    async fn generate_content_reports_raw_body_on_unknown_error() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(500).body("boom");
        });

        let err = client(&server)
            .generate_content(&request())
            .await
            .unwrap_err();

        let msg = format!("{err}");
        assert!(msg.contains("500"));
        assert!(msg.contains("boom"));
    }

    #[tokio::test]
    async fn generate_content_rejects_malformed_json() {
        let server = MockServer::start_async().await;

        server.mock(|when, then| {
            when.method(POST).path(PATH);
            then.status(200).body("not json");
        });

        let err = client(&server)
            .generate_content(&request())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::GeminiError(_)));
        assert!(err.to_string().contains("invalid response"));
    }
}
