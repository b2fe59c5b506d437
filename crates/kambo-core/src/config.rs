//! Configuration model for the assistant.
//!
//! Every field has a default, so an empty or missing `config.toml` yields a
//! working configuration. Secrets live separately in `secret.json`
//! (see [`SecretConfig`]).

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_INPUT_LENGTH: usize = 2000;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";
pub const DEFAULT_CLAUDE_MODEL: &str = "claude-sonnet-4-20250514";

pub const DEFAULT_DISCLAIMER: &str = "This information is for educational purposes only and is not intended as medical advice. Always consult with a qualified healthcare provider before making any health-related decisions.";

pub const DEFAULT_DOMAIN_DEFINITION: &str = "Kambo ceremonies and traditional Amazonian medicine. Related topics include:
- Kambo ceremonies and practices
- Traditional Amazonian medicine
- Indigenous healing practices
- Cultural and spiritual aspects
- Research and studies about Kambo
- Safety and preparation for ceremonies";

/// Which hosted model API backs the generation collaborator.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum GenerationProvider {
    #[default]
    OpenAi,
    Claude,
}

impl std::str::FromStr for GenerationProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "claude" | "anthropic" => Ok(Self::Claude),
            other => Err(format!("unknown generation provider: {other}")),
        }
    }
}

/// Root of `config.toml`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub app_name: String,
    pub generation: GenerationConfig,
    pub guard: GuardConfig,
    pub pipeline: PipelineConfig,
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "Kambo Assistant".to_string(),
            generation: GenerationConfig::default(),
            guard: GuardConfig::default(),
            pipeline: PipelineConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

/// Settings for the generation collaborator.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GenerationConfig {
    pub provider: GenerationProvider,
    /// Model override; `None` uses the provider default.
    pub model: Option<String>,
    pub classifier_temperature: f32,
    pub responder_temperature: f32,
    pub verifier_temperature: f32,
    pub max_tokens: u32,
    /// Upper bound for each generation call.
    pub timeout_secs: u64,
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Model name actually used for the configured provider.
    pub fn effective_model(&self) -> String {
        self.model.clone().unwrap_or_else(|| match self.provider {
            GenerationProvider::OpenAi => DEFAULT_OPENAI_MODEL.to_string(),
            GenerationProvider::Claude => DEFAULT_CLAUDE_MODEL.to_string(),
        })
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: GenerationProvider::default(),
            model: None,
            classifier_temperature: 0.0,
            responder_temperature: 0.1,
            verifier_temperature: 0.0,
            max_tokens: 1000,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Input Guard limits.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct GuardConfig {
    /// Maximum accepted message length in characters.
    pub max_input_length: usize,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
        }
    }
}

/// Orchestrator policy.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    /// Cap on verification-triggered regenerations.
    pub max_attempts: u32,
    /// Definition of the allowed subject domain fed to the classifier.
    pub domain_definition: String,
    /// Fixed suffix appended to every successful answer.
    pub disclaimer: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            domain_definition: DEFAULT_DOMAIN_DEFINITION.to_string(),
            disclaimer: DEFAULT_DISCLAIMER.to_string(),
        }
    }
}

/// Where persisted records go.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Overrides the platform data directory.
    pub data_dir: Option<String>,
}

/// Root configuration structure for secret.json
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct SecretConfig {
    #[serde(default)]
    pub openai: Option<ApiKeyConfig>,
    #[serde(default)]
    pub claude: Option<ApiKeyConfig>,
}

/// API key entry in secret.json
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ApiKeyConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}
