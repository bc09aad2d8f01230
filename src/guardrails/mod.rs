mod pii;
mod toxicity;
mod types;
mod validator;

pub use pii::PiiDetector;
pub use toxicity::{ModerationClient, ToxicLanguage, ToxicityScorer, split_sentences};
pub use types::{CheckResult, ValidationOutcome};
#[cfg(test)]
pub use validator::MockPolicyValidator;
pub use validator::{Guard, PolicyValidator, Validator};

use crate::{
    Result,
    config::{GuardrailsConfig, LlmConfig},
};
use std::sync::Arc;
use tracing::info;

/// Builds the process-wide policy validator, or `None` when guardrails are disabled.
pub fn build_validator(
    guardrails: &GuardrailsConfig,
    llm: &LlmConfig,
) -> Result<Option<Arc<dyn PolicyValidator>>> {
    if !guardrails.enabled {
        info!("Guardrails disabled by configuration");
        return Ok(None);
    }

    let mut guard = Guard::new();

    if guardrails.toxicity.enabled {
        let scorer = ModerationClient::new(
            &guardrails.toxicity.moderation,
            &llm.base_url,
            llm.api_key.clone(),
        )?;
        info!(
            "Toxic language filter enabled (threshold={}, endpoint={})",
            guardrails.toxicity.threshold,
            scorer.endpoint()
        );
        guard = guard.with_validator(
            Box::new(ToxicLanguage::new(
                Arc::new(scorer),
                guardrails.toxicity.threshold,
            )),
            guardrails.toxicity.on_fail,
        );
    }

    if guardrails.pii.enabled {
        info!(
            "PII detection enabled for {:?}",
            guardrails.pii.entities
        );
        guard = guard.with_validator(
            Box::new(PiiDetector::new(&guardrails.pii.entities)?),
            guardrails.pii.on_fail,
        );
    }

    info!("Guardrails enabled with validators {:?}", guard.validator_names());
    Ok(Some(Arc::new(guard)))
}
