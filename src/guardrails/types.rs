use serde::{Deserialize, Serialize};

/// Result of running text through a policy validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "value", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// The text passed, possibly rewritten (for example with PII redacted).
    Accepted(String),
    /// The text must not be used.
    Rejected(String),
}

impl ValidationOutcome {
    pub fn accepted(text: impl Into<String>) -> Self {
        Self::Accepted(text.into())
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }
}

/// Verdict of a single validator inside a guard.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckResult {
    Pass,
    Fail {
        reason: String,
        /// Replacement text used when the validator runs with `on_fail: fix`.
        fix_value: Option<String>,
    },
}

impl CheckResult {
    pub fn fail(reason: impl Into<String>, fix_value: Option<String>) -> Self {
        Self::Fail {
            reason: reason.into(),
            fix_value,
        }
    }
}
