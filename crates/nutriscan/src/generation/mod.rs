//! Text-generation backends used to write product insights.
//!
//! A generator is always built explicitly (see [`create_generator`]) and
//! handed to the code that needs it.

mod fake;
mod huggingface;
mod ollama;

pub use fake::FakeGenerator;
pub use huggingface::HuggingFaceGenerator;
pub use ollama::OllamaGenerator;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for text-generation calls.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation request failed: {0}")]
    Request(String),

    #[error("generation backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to parse generation response: {0}")]
    Parse(String),

    #[error("generation backend returned no candidates")]
    Empty,

    #[error("generator not configured: {0}")]
    NotConfigured(String),
}

/// One generated continuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Generation {
    pub generated_text: String,
}

/// A text-generation capability.
#[async_trait]
pub trait TextGenerator: Send + Sync + fmt::Debug {
    /// Generate continuations of `prompt`, bounded by `max_length`.
    async fn generate(
        &self,
        prompt: &str,
        max_length: u32,
    ) -> Result<Vec<Generation>, GenerationError>;

    /// Backend name (e.g. "huggingface", "ollama", "fake").
    fn backend_name(&self) -> &'static str;

    fn model_name(&self) -> &str;
}

/// Which backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    HuggingFace,
    Ollama,
    Fake,
}

impl Backend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Backend::HuggingFace => "huggingface",
            Backend::Ollama => "ollama",
            Backend::Fake => "fake",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Backend::HuggingFace => huggingface::DEFAULT_MODEL,
            Backend::Ollama => ollama::DEFAULT_MODEL,
            Backend::Fake => fake::MODEL_NAME,
        }
    }

    pub fn default_endpoint(&self) -> &'static str {
        match self {
            Backend::HuggingFace => huggingface::DEFAULT_ENDPOINT,
            Backend::Ollama => ollama::DEFAULT_ENDPOINT,
            Backend::Fake => "",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "huggingface" | "hf" => Ok(Backend::HuggingFace),
            "ollama" => Ok(Backend::Ollama),
            "fake" => Ok(Backend::Fake),
            other => Err(GenerationError::NotConfigured(format!(
                "unknown backend: {other}"
            ))),
        }
    }
}

/// Settings needed to build a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
    pub backend: Backend,
    pub model: String,
    pub endpoint: String,
    pub api_token: Option<String>,
    pub timeout: Duration,
}

impl GeneratorConfig {
    /// Defaults for `backend`.
    pub fn for_backend(backend: Backend) -> Self {
        Self {
            backend,
            model: backend.default_model().to_string(),
            endpoint: backend.default_endpoint().to_string(),
            api_token: None,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Build the generator described by `config`.
pub fn create_generator(config: &GeneratorConfig) -> Result<Box<dyn TextGenerator>, GenerationError> {
    tracing::info!(
        backend = %config.backend,
        model = %config.model,
        "creating text generator"
    );
    match config.backend {
        Backend::HuggingFace => Ok(Box::new(HuggingFaceGenerator::new(
            &config.endpoint,
            &config.model,
            config.api_token.clone(),
            config.timeout,
        )?)),
        Backend::Ollama => Ok(Box::new(OllamaGenerator::new(
            &config.endpoint,
            &config.model,
            config.timeout,
        )?)),
        Backend::Fake => Ok(Box::new(FakeGenerator::default())),
    }
}

/// Build a reqwest client shared by the HTTP backends.
fn http_client(timeout: Duration) -> Result<reqwest::Client, GenerationError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| GenerationError::NotConfigured(format!("http client: {e}")))
}

/// Pull an error message out of a JSON error body, or fall back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("error").cloned())
        .map(|e| match e {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        })
        .unwrap_or_else(|| body.to_string())
}
