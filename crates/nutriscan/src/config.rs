//! Configuration loading and resolution.
//!
//! Each setting resolves as: explicit value (CLI flag) > environment variable > default.

use std::time::Duration;

use thiserror::Error;

use crate::catalog::DEFAULT_CATALOG_URL;
use crate::generation::{Backend, GenerationError, GeneratorConfig};
use crate::insight::DEFAULT_MAX_LENGTH;

pub const ENV_CATALOG_URL: &str = "NUTRISCAN_CATALOG_URL";
pub const ENV_TIMEOUT_SECS: &str = "NUTRISCAN_TIMEOUT_SECS";
pub const ENV_PREFERENCES: &str = "NUTRISCAN_PREFERENCES";
pub const ENV_MAX_LENGTH: &str = "NUTRISCAN_MAX_LENGTH";
pub const ENV_BACKEND: &str = "NUTRISCAN_BACKEND";
pub const ENV_MODEL: &str = "NUTRISCAN_MODEL";
pub const ENV_ENDPOINT: &str = "NUTRISCAN_ENDPOINT";
pub const ENV_HF_TOKEN: &str = "HF_TOKEN";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PREFERENCES: &str =
    "I prefer low-sugar, low-sodium products and want to avoid high-sugar drinks.";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid generator backend: {0}")]
    Backend(#[from] GenerationError),
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub catalog_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub preferences: Option<String>,
    pub max_length: Option<u32>,
    pub backend: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub catalog_url: String,
    pub timeout: Duration,
    pub preferences: String,
    pub max_length: u32,
    pub generator: GeneratorConfig,
}

impl Settings {
    /// Resolve against the process environment.
    pub fn resolve(overrides: Overrides) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve using `env` to look up environment variables.
    pub fn resolve_with<F>(overrides: Overrides, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let catalog_url = overrides
            .catalog_url
            .or_else(|| env(ENV_CATALOG_URL))
            .unwrap_or_else(|| DEFAULT_CATALOG_URL.to_string());

        let timeout_secs = overrides
            .timeout_secs
            .unwrap_or_else(|| parse_env(&env, ENV_TIMEOUT_SECS, DEFAULT_TIMEOUT_SECS));

        // An explicitly empty preference string is kept: it disables the question.
        let preferences = overrides
            .preferences
            .or_else(|| env(ENV_PREFERENCES))
            .unwrap_or_else(|| DEFAULT_PREFERENCES.to_string());

        let max_length = overrides
            .max_length
            .unwrap_or_else(|| parse_env(&env, ENV_MAX_LENGTH, DEFAULT_MAX_LENGTH));

        let backend = match overrides.backend.or_else(|| env(ENV_BACKEND)) {
            Some(name) => name.parse::<Backend>()?,
            None => Backend::default(),
        };

        let mut generator = GeneratorConfig::for_backend(backend);
        if let Some(model) = overrides.model.or_else(|| env(ENV_MODEL)) {
            generator.model = model;
        }
        if let Some(endpoint) = overrides.endpoint.or_else(|| env(ENV_ENDPOINT)) {
            generator.endpoint = endpoint;
        }
        generator.api_token = env(ENV_HF_TOKEN).filter(|t| !t.trim().is_empty());
        // Generation gets at least the catalog timeout.
        generator.timeout = generator.timeout.max(Duration::from_secs(timeout_secs));

        Ok(Self {
            catalog_url,
            timeout: Duration::from_secs(timeout_secs),
            preferences,
            max_length,
            generator,
        })
    }
}

fn parse_env<F, T>(env: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy + std::fmt::Display,
{
    match env(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring invalid {key}={raw:?}, using {default}");
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_set() {
        let settings = Settings::resolve_with(Overrides::default(), env_from(&[])).unwrap();
        assert_eq!(settings.catalog_url, DEFAULT_CATALOG_URL);
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(settings.preferences, DEFAULT_PREFERENCES);
        assert_eq!(settings.max_length, 2000);
        assert_eq!(settings.generator.backend, Backend::HuggingFace);
        assert!(settings.generator.api_token.is_none());
    }

    #[test]
    fn env_beats_default() {
        let env = env_from(&[
            (ENV_CATALOG_URL, "https://fr.openfoodfacts.org"),
            (ENV_MAX_LENGTH, "512"),
            (ENV_BACKEND, "ollama"),
            (ENV_HF_TOKEN, "hf_abc"),
        ]);
        let settings = Settings::resolve_with(Overrides::default(), env).unwrap();
        assert_eq!(settings.catalog_url, "https://fr.openfoodfacts.org");
        assert_eq!(settings.max_length, 512);
        assert_eq!(settings.generator.backend, Backend::Ollama);
        assert_eq!(settings.generator.model, "llama3");
        assert_eq!(settings.generator.api_token.as_deref(), Some("hf_abc"));
    }

    #[test]
    fn explicit_beats_env() {
        let env = env_from(&[(ENV_PREFERENCES, "vegan"), (ENV_MODEL, "from-env")]);
        let overrides = Overrides {
            preferences: Some(String::new()),
            model: Some("from-flag".into()),
            backend: Some("fake".into()),
            ..Overrides::default()
        };
        let settings = Settings::resolve_with(overrides, env).unwrap();
        assert_eq!(settings.preferences, "");
        assert_eq!(settings.generator.model, "from-flag");
        assert_eq!(settings.generator.backend, Backend::Fake);
    }

    #[test]
    fn invalid_numbers_fall_back() {
        let env = env_from(&[(ENV_TIMEOUT_SECS, "soon"), (ENV_MAX_LENGTH, "-1")]);
        let settings = Settings::resolve_with(Overrides::default(), env).unwrap();
        assert_eq!(settings.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert_eq!(settings.max_length, DEFAULT_MAX_LENGTH);
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let env = env_from(&[(ENV_BACKEND, "gpt")]);
        assert!(Settings::resolve_with(Overrides::default(), env).is_err());
    }
}
