//! Two-stage research-paper summarizer over the Gemini `generateContent` API.
//!
//! `paperbrief` turns a paper title into a styled summary in two sequential
//! LLM calls: Stage 1 generates a detailed abstract for the title, Stage 2
//! rewrites that abstract under explicit style and length constraints. The
//! [`Pipeline`](pipeline::Pipeline) gates Stage 2 on Stage 1 producing text.
//!
//! The interesting machinery is the [`GeminiClient`]: it builds the
//! `generateContent` payload, retries transient failures with exponential
//! backoff (see [`retry`]), refuses to retry HTTP 403, and extracts the first
//! candidate's text from the response. Every failure path converges on an
//! empty-string result plus a `tracing` diagnostic — the client never lets a
//! transport or parse fault escape to its caller.
//!
//! # Getting started
//!
//! ```ignore
//! use paperbrief::{GeminiClient, GeminiConfig};
//! use paperbrief::pipeline::{Pipeline, SummaryLength, SummaryStyle};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = GeminiConfig {
//!         api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
//!         ..Default::default()
//!     };
//!     let client = GeminiClient::new(config).unwrap();
//!     let pipeline = Pipeline::new(client);
//!
//!     match pipeline
//!         .run(
//!             "Attention Is All You Need",
//!             SummaryStyle::Technical,
//!             SummaryLength::Short,
//!         )
//!         .await
//!     {
//!         Ok(output) => println!("{}", output.summary),
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod pipeline;
pub mod retry;

use crate::retry::{RetryConfig, Retryable, retry_call};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, error};

// ── Constants ──────────────────────────────────────────────────────

/// Default generation endpoint.
pub const GEMINI_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

/// Human-readable label for the default model, for hosts that display it.
pub const DEFAULT_MODEL_LABEL: &str = "Gemini 2.0 Flash";

/// Well-known paper titles hosts can offer as canned prompts.
pub const SUGGESTED_TITLES: [&str; 6] = [
    "Attention Is All You Need",
    "BERT: Pre-training of Deep Bidirectional Transformers",
    "GPT-3: Language Models are Few-Shot Learners",
    "Diffusion Models Beat GANs on Image Synthesis",
    "Reinforcement Learning from Human Feedback (RLHF)",
    "ImageNet Classification with Deep Convolutional Neural Networks (AlexNet)",
];

// ── Task kind ──────────────────────────────────────────────────────

/// What the model is being asked to do.
///
/// Selects the sampling temperature: open-ended generation runs hotter than
/// constrained summarization. Callers state the kind explicitly rather than
/// the client sniffing the instruction text for keywords.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    /// Open-ended text generation (e.g. writing an abstract).
    Generation,
    /// Constrained rewriting of existing text.
    Summarization,
}

impl TaskKind {
    /// Fixed temperature for this task kind. Not user-configurable.
    pub fn temperature(self) -> f32 {
        match self {
            TaskKind::Generation => 0.9,
            TaskKind::Summarization => 0.7,
        }
    }
}

// ── Request types ──────────────────────────────────────────────────

/// `generateContent` request body: prompt contents, system instruction, and
/// generation config. Built fresh for each call and never mutated.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub contents: Vec<Content>,
    pub system_instruction: Content,
    pub generation_config: GenerationConfig,
}

/// A block of parts. Both the user prompt and the system instruction use
/// this shape on the wire.
#[derive(Serialize, Debug)]
pub struct Content {
    pub parts: Vec<Part>,
}

#[derive(Serialize, Debug)]
pub struct Part {
    pub text: String,
}

impl Content {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![Part { text: text.into() }],
        }
    }
}

/// Sampling parameters for a single call.
#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl GenerateRequest {
    /// Assemble the payload for one generation call.
    pub fn new(
        user_prompt: impl Into<String>,
        system_instruction: impl Into<String>,
        max_output_tokens: u32,
        task: TaskKind,
    ) -> Self {
        Self {
            contents: vec![Content::text(user_prompt)],
            system_instruction: Content::text(system_instruction),
            generation_config: GenerationConfig {
                max_output_tokens,
                temperature: task.temperature(),
            },
        }
    }
}

// ── Response types ─────────────────────────────────────────────────

/// Raw API response (internal deserialization target).
///
/// Every level is optional so a thin or empty response degrades to "no text"
/// instead of a deserialization error.
#[derive(Deserialize, Debug)]
struct RawGenerateResponse {
    candidates: Option<Vec<RawCandidate>>,
}

#[derive(Deserialize, Debug)]
struct RawCandidate {
    content: Option<RawContent>,
}

#[derive(Deserialize, Debug)]
struct RawContent {
    parts: Option<Vec<RawPart>>,
}

#[derive(Deserialize, Debug)]
struct RawPart {
    text: Option<String>,
}

impl RawGenerateResponse {
    /// First candidate's first part's text, trimmed. Empty string when any
    /// level of the structure is missing.
    fn extract_text(&self) -> String {
        self.candidates
            .as_deref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_deref())
            .and_then(|p| p.first())
            .and_then(|p| p.text.as_deref())
            .map(|t| t.trim().to_string())
            .unwrap_or_default()
    }
}

// ── Errors ─────────────────────────────────────────────────────────

/// Failure classes inside one HTTP attempt. Never escapes
/// [`GeminiClient::call`] — every variant collapses to an empty-string
/// result after logging.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP 403. A key/configuration problem retrying cannot fix.
    #[error("authorization rejected (HTTP 403): the API key is missing or invalid: {0}")]
    Forbidden(String),
    /// Connection failure, timeout, or a non-2xx status other than 403.
    #[error("request failed: {0}")]
    Transient(String),
    /// A 2xx body that is not valid JSON.
    #[error("malformed response body: {0}")]
    MalformedResponse(String),
}

impl Retryable for ApiError {
    fn is_transient(&self) -> bool {
        matches!(self, ApiError::Transient(_))
    }
}

// ── Client ─────────────────────────────────────────────────────────

/// Explicit client configuration. Passed in at construction so tests can
/// point the client at a mock endpoint with a fast retry schedule.
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// `generateContent` endpoint URL.
    pub endpoint: String,
    /// API key appended as the `key` query parameter. An empty key omits the
    /// parameter entirely and relies on ambient authentication.
    pub api_key: String,
    /// Display label for the model behind the endpoint.
    pub model_label: String,
    /// Backoff schedule for transient failures.
    pub retry: RetryConfig,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: GEMINI_URL.to_string(),
            api_key: String::new(),
            model_label: DEFAULT_MODEL_LABEL.to_string(),
            retry: RetryConfig::default(),
        }
    }
}

/// Async HTTP client for the Gemini `generateContent` API.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client from an explicit configuration.
    pub fn new(config: GeminiConfig) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .user_agent("paperbrief/0.1")
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| format!("failed to build HTTP client: {e}"))?;
        Ok(Self { client, config })
    }

    /// The configured model label, for hosts that display it.
    pub fn model_label(&self) -> &str {
        &self.config.model_label
    }

    /// Endpoint plus the `key` query parameter when a key is configured.
    fn request_url(&self) -> String {
        if self.config.api_key.is_empty() {
            self.config.endpoint.clone()
        } else {
            format!("{}?key={}", self.config.endpoint, self.config.api_key)
        }
    }

    /// One HTTP attempt: POST the payload, classify the status, extract text.
    async fn generate(&self, body: &GenerateRequest) -> Result<String, ApiError> {
        debug!(
            "Gemini request: max_tokens={}, temp={}",
            body.generation_config.max_output_tokens, body.generation_config.temperature,
        );

        let start = Instant::now();

        let resp = self
            .client
            .post(self.request_url())
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Transient(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Transient(format!("failed to read response: {e}")))?;

        debug!(
            "Gemini response: HTTP {} in {:.1}s ({} bytes)",
            status,
            start.elapsed().as_secs_f64(),
            text.len()
        );

        if status == reqwest::StatusCode::FORBIDDEN {
            return Err(ApiError::Forbidden(text));
        }
        if !status.is_success() {
            return Err(ApiError::Transient(format!("Gemini API HTTP {status}: {text}")));
        }

        let parsed: RawGenerateResponse =
            serde_json::from_str(&text).map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

        let extracted = parsed.extract_text();
        if extracted.is_empty() {
            debug!("Gemini output: empty (no candidates or no text)");
        } else {
            debug!("Gemini output: {} chars", extracted.len());
        }
        Ok(extracted)
    }

    /// Obtain generated text for a prompt, retrying transient failures per
    /// the configured [`RetryConfig`].
    ///
    /// Always returns a value: the extracted text on success, or `""` after
    /// a 403, a malformed body, or exhausted retries. Failures are reported
    /// once through `tracing` — callers distinguish "got text" from "failed"
    /// purely by emptiness.
    pub async fn call(
        &self,
        user_prompt: &str,
        system_instruction: &str,
        max_output_tokens: u32,
        task: TaskKind,
    ) -> String {
        let body = GenerateRequest::new(user_prompt, system_instruction, max_output_tokens, task);

        match retry_call(&self.config.retry, || self.generate(&body)).await {
            Ok(text) => text,
            Err(e @ ApiError::Forbidden(_)) => {
                error!("{e}");
                String::new()
            }
            Err(e @ ApiError::MalformedResponse(_)) => {
                error!("unexpected error during API processing: {e}");
                String::new()
            }
            Err(e) => {
                error!(
                    "final API call failed after {} attempts: {e}",
                    self.config.retry.max_attempts
                );
                String::new()
            }
        }
    }
}
