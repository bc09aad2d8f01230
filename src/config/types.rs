use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub guardrails: GuardrailsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub logs: LogsConfig,
    #[serde(default = "default_project")]
    pub project: String,
    /// Return raw model-provider error text to callers instead of a generic message.
    #[serde(default)]
    pub expose_error_details: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogsConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardrailsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub output_rejection: OutputRejection,
    #[serde(default)]
    pub pii: PiiConfig,
    #[serde(default)]
    pub toxicity: ToxicityConfig,
}

/// What the pipeline does when the model output is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputRejection {
    /// Answer 200 with a placeholder instead of the model text.
    #[default]
    Degrade,
    /// Answer 400, same as an input rejection.
    Abort,
}

/// Per-validator failure action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnFail {
    Exception,
    Fix,
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiEntity {
    EmailAddress,
    PhoneNumber,
    CreditCard,
}

impl PiiEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmailAddress => "EMAIL_ADDRESS",
            Self::PhoneNumber => "PHONE_NUMBER",
            Self::CreditCard => "CREDIT_CARD",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiiConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_pii_entities")]
    pub entities: Vec<PiiEntity>,
    #[serde(default = "default_pii_on_fail")]
    pub on_fail: OnFail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToxicityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_toxicity_threshold")]
    pub threshold: f32,
    #[serde(default = "default_toxicity_on_fail")]
    pub on_fail: OnFail,
    #[serde(default)]
    pub moderation: ModerationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationConfig {
    /// Falls back to `llm.base_url`, then the public OpenAI API.
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "default_moderation_model")]
    pub model: String,
    #[serde(default = "default_moderation_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            logs: LogsConfig::default(),
            project: default_project(),
            expose_error_details: false,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for GuardrailsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_rejection: OutputRejection::default(),
            pii: PiiConfig::default(),
            toxicity: ToxicityConfig::default(),
        }
    }
}

impl Default for PiiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            entities: default_pii_entities(),
            on_fail: default_pii_on_fail(),
        }
    }
}

impl Default for ToxicityConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            threshold: default_toxicity_threshold(),
            on_fail: default_toxicity_on_fail(),
            moderation: ModerationConfig::default(),
        }
    }
}

impl Default for ModerationConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            model: default_moderation_model(),
            timeout_secs: default_moderation_timeout_secs(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_system_prompt() -> String {
    "You are a helpful assistant.".to_string()
}

fn default_max_tokens() -> u32 {
    500
}

fn default_temperature() -> f32 {
    0.7
}

fn default_llm_timeout_secs() -> u64 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_project() -> String {
    "llm-guardrails-demo".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pii_entities() -> Vec<PiiEntity> {
    vec![
        PiiEntity::EmailAddress,
        PiiEntity::PhoneNumber,
        PiiEntity::CreditCard,
    ]
}

fn default_pii_on_fail() -> OnFail {
    OnFail::Fix
}

fn default_toxicity_threshold() -> f32 {
    0.5
}

fn default_toxicity_on_fail() -> OnFail {
    OnFail::Exception
}

fn default_moderation_model() -> String {
    "omni-moderation-latest".to_string()
}

fn default_moderation_timeout_secs() -> u64 {
    10
}
