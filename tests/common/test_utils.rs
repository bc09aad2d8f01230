use axum::Router;
use axum_test::TestServer;
use guardrail_gateway::{
    config::{self, Config, LlmConfig, LogsConfig, OutputRejection, ServerConfig},
    guardrails::PolicyValidator,
    llm::LlmClient,
    pipeline::{Pipeline, PipelineSettings},
    server::{
        self,
        handlers::{AppState, Capabilities},
    },
};
use std::sync::Arc;

/// Create a test configuration with sensible defaults
pub fn create_test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8080,
            logs: LogsConfig {
                level: "debug".to_string(),
            },
            ..ServerConfig::default()
        },
        llm: LlmConfig {
            api_key: "test-api-key".to_string(),
            ..LlmConfig::default()
        },
        ..Config::default()
    }
}

pub fn create_test_config_with_output_rejection(mode: OutputRejection) -> Config {
    let mut config = create_test_config();
    config.guardrails.output_rejection = mode;
    config
}

/// Build the router with injected collaborators. `validator: None` means guardrails disabled.
pub fn create_test_app<L>(
    config: &Config,
    llm: L,
    validator: Option<Arc<dyn PolicyValidator>>,
) -> Router
where
    L: LlmClient + 'static,
{
    let pipeline = Pipeline::new(
        Arc::new(llm),
        validator,
        PipelineSettings::from_config(config),
    );
    let state = AppState {
        pipeline: Arc::new(pipeline),
        capabilities: Arc::new(Capabilities::from_config(config)),
    };
    server::router(state)
}

pub fn create_test_server<L>(
    config: &Config,
    llm: L,
    validator: Option<Arc<dyn PolicyValidator>>,
) -> TestServer
where
    L: LlmClient + 'static,
{
    TestServer::new(create_test_app(config, llm, validator)).expect("Failed to start test server")
}

/// Parse a sample YAML document into a configuration
pub fn parse_config(yaml: &str) -> Config {
    config::from_yaml_str(yaml).expect("Sample config should parse")
}

/// Sample configuration YAML for testing
pub const SAMPLE_CONFIG_YAML: &str = r#"
server:
  host: "127.0.0.1"
  port: 8080
  project: "guardrail-gateway-tests"
  logs:
    level: "info"

llm:
  api_key: "test-api-key"
  model: "gpt-4o-mini"
  max_tokens: 500
  temperature: 0.7

guardrails:
  enabled: true
  output_rejection: degrade
  pii:
    entities: ["EMAIL_ADDRESS", "PHONE_NUMBER", "CREDIT_CARD"]
    on_fail: fix
  toxicity:
    threshold: 0.5
    on_fail: exception
"#;

/// Moderation response body with one score per sentence
pub fn moderation_body(scores: &[f32]) -> serde_json::Value {
    let results: Vec<serde_json::Value> = scores
        .iter()
        .map(|score| {
            serde_json::json!({
                "flagged": *score >= 0.5,
                "categories": { "harassment": *score >= 0.5 },
                "category_scores": { "harassment": score, "hate": 0.01 }
            })
        })
        .collect();
    serde_json::json!({
        "id": "modr-test",
        "model": "omni-moderation-latest",
        "results": results
    })
}

/// Chat completion response body as returned by the OpenAI API
pub fn chat_completion_body(content: &str) -> serde_json::Value {
    serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1733700000,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop",
            "logprobs": null
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
    })
}
