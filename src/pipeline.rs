//! The request-validation pipeline: validate input, call the model,
//! validate or repair the output, shape the answer.

use crate::{
    config::{Config, OutputRejection},
    guardrails::{PolicyValidator, ValidationOutcome},
    llm::{CompletionRequest, LlmClient},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const MISSING_PROMPT_ERROR: &str = "Prompt is required";
pub const OUTPUT_PLACEHOLDER: &str = "[Response modified by guardrails for safety]";
pub const MODEL_ERROR_RESPONSE: &str = "[ERROR]";
pub const DEFAULT_USER_ID: &str = "anonymous";

const GENERIC_MODEL_ERROR: &str = "model request failed";
const GENERIC_VALIDATOR_ERROR: &str = "policy check unavailable";

/// Answer body returned with HTTP 200.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub prediction_id: Uuid,
    pub prompt: String,
    pub response: String,
    pub guardrails_passed: bool,
    pub actions: Vec<String>,
    pub model: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// A request stopped by a guardrail.
#[derive(Debug, Clone, PartialEq)]
pub struct Blocked {
    pub prediction_id: Uuid,
    pub error: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    /// Prompt missing or blank; nothing downstream ran.
    MissingPrompt,
    Blocked(Blocked),
    Answered(Answer),
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub output_rejection: OutputRejection,
    pub expose_error_details: bool,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.llm.model.clone(),
            system_prompt: config.llm.system_prompt.clone(),
            max_tokens: config.llm.max_tokens,
            temperature: config.llm.temperature,
            output_rejection: config.guardrails.output_rejection,
            expose_error_details: config.server.expose_error_details,
        }
    }
}

pub struct Pipeline {
    llm: Arc<dyn LlmClient>,
    validator: Option<Arc<dyn PolicyValidator>>,
    settings: PipelineSettings,
}

impl Pipeline {
    /// `validator` is `None` when guardrails are disabled.
    pub fn new(
        llm: Arc<dyn LlmClient>,
        validator: Option<Arc<dyn PolicyValidator>>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            llm,
            validator,
            settings,
        }
    }

    pub fn guardrails_enabled(&self) -> bool {
        self.validator.is_some()
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    pub async fn run(&self, prompt: Option<&str>, user_id: Option<String>) -> PipelineOutcome {
        let prompt = prompt.map(str::trim).unwrap_or_default();
        if prompt.is_empty() {
            return PipelineOutcome::MissingPrompt;
        }

        let prediction_id = Uuid::new_v4();
        let user_id = user_id.unwrap_or_else(|| DEFAULT_USER_ID.to_string());
        let mut actions = Vec::new();

        info!(%prediction_id, %user_id, "Processing prompt ({} chars)", prompt.len());

        let prompt = match &self.validator {
            None => {
                actions.push("Input validation skipped (guardrails disabled)".to_string());
                prompt.to_string()
            }
            Some(validator) => match self.check(validator.as_ref(), prompt, "input").await {
                ValidationOutcome::Accepted(text) => {
                    actions.push("Input validation passed".to_string());
                    text
                }
                ValidationOutcome::Rejected(reason) => {
                    actions.push(format!("Input validation failed: {}", reason));
                    return PipelineOutcome::Blocked(Blocked {
                        prediction_id,
                        error: format!("Guardrails blocked request: {}", reason),
                        actions,
                    });
                }
            },
        };

        let request = CompletionRequest {
            model: self.settings.model.clone(),
            system_prompt: self.settings.system_prompt.clone(),
            prompt: prompt.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            user: Some(user_id.clone()),
        };

        let completion = match self.llm.complete(request).await {
            Ok(completion) => completion,
            Err(e) => {
                error!(%prediction_id, "Model request failed: {}", e);
                let detail = if self.settings.expose_error_details {
                    e.to_string()
                } else {
                    GENERIC_MODEL_ERROR.to_string()
                };
                let message = format!("API Error: {}", detail);
                actions.push(message.clone());
                return PipelineOutcome::Answered(Answer {
                    prediction_id,
                    prompt,
                    response: MODEL_ERROR_RESPONSE.to_string(),
                    guardrails_passed: false,
                    actions,
                    model: self.settings.model.clone(),
                    user_id,
                    error_message: Some(message),
                });
            }
        };

        if let Some(usage) = &completion.usage {
            info!(
                %prediction_id,
                "Model usage: prompt={}, completion={}, total={}",
                usage.prompt_tokens, usage.completion_tokens, usage.total_tokens
            );
        }

        let mut guardrails_passed = true;
        let response = match &self.validator {
            None => {
                actions.push("Output validation skipped (guardrails disabled)".to_string());
                completion.text
            }
            Some(validator) => {
                match self.check(validator.as_ref(), &completion.text, "output").await {
                    ValidationOutcome::Accepted(text) => {
                        actions.push("Output validation passed".to_string());
                        text
                    }
                    ValidationOutcome::Rejected(reason) => match self.settings.output_rejection {
                        OutputRejection::Degrade => {
                            actions.push(format!(
                                "Output validation modified response: {}",
                                reason
                            ));
                            guardrails_passed = false;
                            OUTPUT_PLACEHOLDER.to_string()
                        }
                        OutputRejection::Abort => {
                            actions.push(format!("Output validation failed: {}", reason));
                            return PipelineOutcome::Blocked(Blocked {
                                prediction_id,
                                error: format!("Guardrails blocked response: {}", reason),
                                actions,
                            });
                        }
                    },
                }
            }
        };

        info!(%prediction_id, guardrails_passed, "Request completed");

        PipelineOutcome::Answered(Answer {
            prediction_id,
            prompt,
            response,
            guardrails_passed,
            actions,
            model: self.settings.model.clone(),
            user_id,
            error_message: None,
        })
    }

    /// A validator that errors counts as a rejection.
    async fn check(&self, validator: &dyn PolicyValidator, text: &str, stage: &str) -> ValidationOutcome {
        match validator.validate(text).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Policy validator failed on {}: {}", stage, e);
                let reason = if self.settings.expose_error_details {
                    e.to_string()
                } else {
                    GENERIC_VALIDATOR_ERROR.to_string()
                };
                ValidationOutcome::Rejected(reason)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        Error,
        guardrails::MockPolicyValidator,
        llm::{Completion, MockLlmClient},
    };
    use pretty_assertions::assert_eq;

    fn settings() -> PipelineSettings {
        PipelineSettings {
            model: "gpt-4o-mini".to_string(),
            system_prompt: "You are a helpful assistant.".to_string(),
            max_tokens: 500,
            temperature: 0.7,
            output_rejection: OutputRejection::Degrade,
            expose_error_details: false,
        }
    }

    fn accept_all() -> MockPolicyValidator {
        let mut validator = MockPolicyValidator::new();
        validator
            .expect_validate()
            .returning(|text| Ok(ValidationOutcome::accepted(text)));
        validator
    }

    fn answer(outcome: PipelineOutcome) -> Answer {
        match outcome {
            PipelineOutcome::Answered(answer) => answer,
            other => panic!("expected answer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_prompt_short_circuits() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete().never();
        let mut validator = MockPolicyValidator::new();
        validator.expect_validate().never();

        let pipeline = Pipeline::new(Arc::new(llm), Some(Arc::new(validator)), settings());
        assert_eq!(pipeline.run(Some("   \n\t"), None).await, PipelineOutcome::MissingPrompt);
        assert_eq!(pipeline.run(None, None).await, PipelineOutcome::MissingPrompt);
    }

    #[tokio::test]
    async fn test_happy_path_sends_trimmed_prompt_with_settings() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .withf(|req: &CompletionRequest| {
                req.prompt == "hello"
                    && req.model == "gpt-4o-mini"
                    && req.max_tokens == 500
                    && req.user.as_deref() == Some("anonymous")
            })
            .times(1)
            .returning(|_| Ok(Completion::text("hi")));

        let pipeline = Pipeline::new(Arc::new(llm), Some(Arc::new(accept_all())), settings());
        let answer = answer(pipeline.run(Some("  hello  "), None).await);

        assert_eq!(answer.response, "hi");
        assert_eq!(answer.prompt, "hello");
        assert!(answer.guardrails_passed);
        assert_eq!(answer.user_id, "anonymous");
        assert_eq!(
            answer.actions,
            vec!["Input validation passed", "Output validation passed"]
        );
        assert_eq!(answer.error_message, None);
    }

    #[tokio::test]
    async fn test_input_rejection_blocks_before_model() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete().never();
        let mut validator = MockPolicyValidator::new();
        validator
            .expect_validate()
            .times(1)
            .returning(|_| Ok(ValidationOutcome::rejected("toxic language")));

        let pipeline = Pipeline::new(Arc::new(llm), Some(Arc::new(validator)), settings());
        match pipeline.run(Some("you idiot"), Some("u1".to_string())).await {
            PipelineOutcome::Blocked(blocked) => {
                assert_eq!(blocked.error, "Guardrails blocked request: toxic language");
                assert_eq!(blocked.actions, vec!["Input validation failed: toxic language"]);
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_output_rejection_degrades_or_aborts() {
        for mode in [OutputRejection::Degrade, OutputRejection::Abort] {
            let mut llm = MockLlmClient::new();
            llm.expect_complete()
                .returning(|_| Ok(Completion::text("unsafe words")));
            let mut validator = MockPolicyValidator::new();
            validator
                .expect_validate()
                .returning(|text| {
                    if text == "unsafe words" {
                        Ok(ValidationOutcome::rejected("toxic"))
                    } else {
                        Ok(ValidationOutcome::accepted(text))
                    }
                });

            let mut settings = settings();
            settings.output_rejection = mode;
            let pipeline = Pipeline::new(Arc::new(llm), Some(Arc::new(validator)), settings);
            let outcome = pipeline.run(Some("tell me"), None).await;

            match (mode, outcome) {
                (OutputRejection::Degrade, PipelineOutcome::Answered(answer)) => {
                    assert_eq!(answer.response, OUTPUT_PLACEHOLDER);
                    assert!(!answer.guardrails_passed);
                    assert_eq!(
                        answer.actions.last().unwrap(),
                        "Output validation modified response: toxic"
                    );
                }
                (OutputRejection::Abort, PipelineOutcome::Blocked(blocked)) => {
                    assert_eq!(blocked.error, "Guardrails blocked response: toxic");
                    assert_eq!(blocked.actions.len(), 2);
                }
                (mode, other) => panic!("unexpected outcome for {:?}: {:?}", mode, other),
            }
        }
    }

    #[tokio::test]
    async fn test_model_error_degrades_with_generic_message() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .returning(|_| Err(Error::llm("insufficient_quota: sk-secret")));

        let pipeline = Pipeline::new(Arc::new(llm), Some(Arc::new(accept_all())), settings());
        let answer = answer(pipeline.run(Some("hello"), None).await);

        assert_eq!(answer.response, MODEL_ERROR_RESPONSE);
        assert!(!answer.guardrails_passed);
        assert_eq!(answer.error_message.as_deref(), Some("API Error: model request failed"));
        assert!(!answer.actions.iter().any(|a| a.contains("sk-secret")));
    }

    #[tokio::test]
    async fn test_model_error_detail_exposed_when_configured() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .returning(|_| Err(Error::Timeout { secs: 30 }));

        let mut settings = settings();
        settings.expose_error_details = true;
        let pipeline = Pipeline::new(Arc::new(llm), Some(Arc::new(accept_all())), settings);
        let answer = answer(pipeline.run(Some("hello"), None).await);

        assert_eq!(
            answer.error_message.as_deref(),
            Some("API Error: Request timed out after 30s")
        );
    }

    #[tokio::test]
    async fn test_validator_error_fails_closed() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete().never();
        let mut validator = MockPolicyValidator::new();
        validator
            .expect_validate()
            .returning(|_| Err(Error::guardrail("down")));

        let pipeline = Pipeline::new(Arc::new(llm), Some(Arc::new(validator)), settings());
        match pipeline.run(Some("hello"), None).await {
            PipelineOutcome::Blocked(blocked) => {
                assert_eq!(
                    blocked.error,
                    "Guardrails blocked request: policy check unavailable"
                );
            }
            other => panic!("expected block, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_output_validator_error_fails_closed() {
        for mode in [OutputRejection::Degrade, OutputRejection::Abort] {
            let mut llm = MockLlmClient::new();
            llm.expect_complete()
                .times(1)
                .returning(|_| Ok(Completion::text("model text")));
            let mut validator = MockPolicyValidator::new();
            validator.expect_validate().times(2).returning(|text| {
                if text == "model text" {
                    Err(Error::guardrail("moderation timed out"))
                } else {
                    Ok(ValidationOutcome::accepted(text))
                }
            });

            let mut settings = settings();
            settings.output_rejection = mode;
            let pipeline = Pipeline::new(Arc::new(llm), Some(Arc::new(validator)), settings);
            let outcome = pipeline.run(Some("hello"), None).await;

            match (mode, outcome) {
                (OutputRejection::Degrade, PipelineOutcome::Answered(answer)) => {
                    assert_eq!(answer.response, OUTPUT_PLACEHOLDER);
                    assert!(!answer.guardrails_passed);
                    assert_eq!(
                        answer.actions,
                        vec![
                            "Input validation passed",
                            "Output validation modified response: policy check unavailable"
                        ]
                    );
                }
                (OutputRejection::Abort, PipelineOutcome::Blocked(blocked)) => {
                    assert_eq!(
                        blocked.error,
                        "Guardrails blocked response: policy check unavailable"
                    );
                    assert_eq!(
                        blocked.actions.last().unwrap(),
                        "Output validation failed: policy check unavailable"
                    );
                }
                (mode, other) => panic!("unexpected outcome for {:?}: {:?}", mode, other),
            }
        }
    }

    #[tokio::test]
    async fn test_disabled_guardrails_skip_validation() {
        let mut llm = MockLlmClient::new();
        llm.expect_complete()
            .times(1)
            .returning(|_| Ok(Completion::text("raw answer")));

        let pipeline = Pipeline::new(Arc::new(llm), None, settings());
        assert!(!pipeline.guardrails_enabled());
        let answer = answer(pipeline.run(Some("hello"), Some("u7".to_string())).await);

        assert_eq!(answer.response, "raw answer");
        assert!(answer.guardrails_passed);
        assert_eq!(answer.user_id, "u7");
        assert_eq!(
            answer.actions,
            vec![
                "Input validation skipped (guardrails disabled)",
                "Output validation skipped (guardrails disabled)"
            ]
        );
    }
}
