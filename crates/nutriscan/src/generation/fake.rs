//! Deterministic generator for tests and offline runs.
//!
//! Responses are picked by case-insensitive substring match on the prompt.
//! Every call is recorded so tests can assert whether the generator ran.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{Generation, GenerationError, TextGenerator};

pub(super) const MODEL_NAME: &str = "fake-model";

const DEFAULT_RESPONSE: &str =
    "This product looks reasonable in moderation. Check the sugar and sodium lines against your goals.";

#[derive(Debug)]
pub struct FakeGenerator {
    /// (prompt substring, response) pairs, checked in insertion order.
    responses: Vec<(String, String)>,
    default_response: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl Default for FakeGenerator {
    fn default() -> Self {
        Self {
            responses: Vec::new(),
            default_response: Some(DEFAULT_RESPONSE.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGenerator {
    /// A generator with no canned responses and no fallback; every call fails
    /// until a response is added.
    pub fn strict() -> Self {
        Self {
            default_response: None,
            ..Self::default()
        }
    }

    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut generator = Self::strict();
        generator.add_response(prompt_contains, response);
        generator
    }

    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .push((prompt_contains.to_lowercase(), response.to_string()));
    }

    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or_default()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _max_length: u32,
    ) -> Result<Vec<Generation>, GenerationError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }

        let prompt_lower = prompt.to_lowercase();
        let response = self
            .responses
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern))
            .map(|(_, response)| response.clone())
            .or_else(|| self.default_response.clone());

        match response {
            Some(text) => Ok(vec![Generation {
                generated_text: text,
            }]),
            None => Err(GenerationError::Request(format!(
                "FakeGenerator: no response configured for prompt (first 100 chars): {}",
                prompt.chars().take(100).collect::<String>()
            ))),
        }
    }

    fn backend_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let generator = FakeGenerator::with_response("SUGAR", "too sweet");
        let out = generator.generate("Sugars: 40", 10).await.unwrap();
        assert_eq!(out[0].generated_text, "too sweet");
    }

    #[tokio::test]
    async fn test_no_match_without_default() {
        let generator = FakeGenerator::strict();
        assert!(generator.generate("anything", 10).await.is_err());
        assert_eq!(generator.call_count(), 1);
    }

    #[tokio::test]
    async fn test_default_answers_but_strict_refuses() {
        let lenient = FakeGenerator::default();
        let out = lenient.generate("anything", 10).await.unwrap();
        assert_eq!(out[0].generated_text, DEFAULT_RESPONSE);

        let strict = FakeGenerator::strict();
        assert!(strict.generate("anything", 10).await.is_err());
    }

    #[tokio::test]
    async fn test_default_response() {
        let generator = FakeGenerator::strict().with_default_response("ok");
        let out = generator.generate("anything", 10).await.unwrap();
        assert_eq!(out[0].generated_text, "ok");
        assert_eq!(generator.prompts(), vec!["anything".to_string()]);
    }
}
