//! Hugging Face Inference API text-generation backend.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{error_message, http_client, Generation, GenerationError, TextGenerator};

pub(super) const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co";
pub(super) const DEFAULT_MODEL: &str = "meta-llama/Llama-2-7b-chat-hf";

#[derive(Debug)]
pub struct HuggingFaceGenerator {
    endpoint: String,
    model: String,
    api_token: Option<String>,
    client: reqwest::Client,
}

impl HuggingFaceGenerator {
    pub fn new(
        endpoint: &str,
        model: &str,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_token,
            client: http_client(timeout)?,
        })
    }

    fn model_url(&self) -> String {
        format!("{}/models/{}", self.endpoint, self.model)
    }
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_length: u32,
    return_full_text: bool,
}

#[async_trait]
impl TextGenerator for HuggingFaceGenerator {
    async fn generate(
        &self,
        prompt: &str,
        max_length: u32,
    ) -> Result<Vec<Generation>, GenerationError> {
        let request = InferenceRequest {
            inputs: prompt,
            parameters: InferenceParameters {
                max_length,
                return_full_text: false,
            },
        };

        let mut builder = self.client.post(self.model_url()).json(&request);
        if let Some(token) = &self.api_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
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

        let generations: Vec<Generation> =
            serde_json::from_str(&body).map_err(|e| GenerationError::Parse(e.to_string()))?;
        tracing::debug!(candidates = generations.len(), "huggingface generation complete");
        Ok(generations)
    }

    fn backend_name(&self) -> &'static str {
        "huggingface"
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_prompt_and_parses_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/test/model"))
            .and(header("authorization", "Bearer hf_secret"))
            .and(body_partial_json(serde_json::json!({
                "inputs": "hello",
                "parameters": { "max_length": 64 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "generated_text": "first" },
                { "generated_text": "second" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let generator = HuggingFaceGenerator::new(
            &server.uri(),
            "test/model",
            Some("hf_secret".into()),
            Duration::from_secs(5),
        )
        .unwrap();
        let out = generator.generate("hello", 64).await.unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].generated_text, "first");
    }

    #[tokio::test]
    async fn surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(503)
                    .set_body_json(serde_json::json!({ "error": "Model is currently loading" })),
            )
            .mount(&server)
            .await;

        let generator =
            HuggingFaceGenerator::new(&server.uri(), "m", None, Duration::from_secs(5)).unwrap();
        match generator.generate("hello", 64).await {
            Err(GenerationError::Api { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "Model is currently loading");
            }
            other => panic!("expected api error, got {other:?}"),
        }
    }
}
