//! Ollama (local LLM) backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{error_message, http_client, Generation, GenerationError, TextGenerator};

pub(super) const DEFAULT_ENDPOINT: &str = "http://localhost:11434";
pub(super) const DEFAULT_MODEL: &str = "llama3";

#[derive(Debug)]
pub struct OllamaGenerator {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(endpoint: &str, model: &str, timeout: Duration) -> Result<Self, GenerationError> {
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client: http_client(timeout)?,
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(
        &self,
        prompt: &str,
        max_length: u32,
    ) -> Result<Vec<Generation>, GenerationError> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                num_predict: max_length,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/generate", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(GenerationError::Api {
                status,
                message: error_message(&body),
            });
        }

        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| GenerationError::Parse(e.to_string()))?;
        Ok(vec![Generation {
            generated_text: parsed.response,
        }])
    }

    fn backend_name(&self) -> &'static str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
