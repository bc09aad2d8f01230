use super::types::{CheckResult, ValidationOutcome};
use crate::{Result, config::OnFail};
use async_trait::async_trait;
use tracing::{debug, info, warn};

/// Inspects text and either passes it through (possibly rewritten) or rejects it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PolicyValidator: Send + Sync {
    async fn validate(&self, text: &str) -> Result<ValidationOutcome>;
}

/// One check a [`Guard`] runs, such as PII detection or toxicity scoring.
#[async_trait]
pub trait Validator: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self, text: &str) -> Result<CheckResult>;
}

/// Runs validators in order, threading fixed text from one to the next.
pub struct Guard {
    validators: Vec<(Box<dyn Validator>, OnFail)>,
}

impl Guard {
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    pub fn with_validator(mut self, validator: Box<dyn Validator>, on_fail: OnFail) -> Self {
        self.validators.push((validator, on_fail));
        self
    }

    pub fn validator_names(&self) -> Vec<&str> {
        self.validators.iter().map(|(v, _)| v.name()).collect()
    }
}

impl Default for Guard {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PolicyValidator for Guard {
    async fn validate(&self, text: &str) -> Result<ValidationOutcome> {
        let mut current = text.to_string();

        for (validator, on_fail) in &self.validators {
            match validator.check(&current).await? {
                CheckResult::Pass => {
                    debug!("Validator '{}' passed", validator.name());
                }
                CheckResult::Fail { reason, fix_value } => match on_fail {
                    OnFail::Exception => {
                        info!("Validator '{}' rejected text: {}", validator.name(), reason);
                        return Ok(ValidationOutcome::Rejected(reason));
                    }
                    OnFail::Fix => {
                        info!("Validator '{}' fixed text: {}", validator.name(), reason);
                        if let Some(fixed) = fix_value {
                            current = fixed;
                        }
                    }
                    OnFail::Noop => {
                        warn!(
                            "Validator '{}' failed, keeping text unchanged: {}",
                            validator.name(),
                            reason
                        );
                    }
                },
            }
        }

        Ok(ValidationOutcome::Accepted(current))
    }
}
