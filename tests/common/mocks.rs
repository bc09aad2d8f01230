use async_trait::async_trait;
use guardrail_gateway::{
    Error, Result,
    guardrails::{PolicyValidator, ValidationOutcome},
    llm::{Completion, CompletionRequest, LlmClient, Usage},
    scan::{ToolOutput, ToolRunner},
};
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Mock LLM client that records every request it receives
#[derive(Debug, Clone)]
pub struct MockLlmClient {
    pub requests: Arc<Mutex<Vec<CompletionRequest>>>,
    pub reply: String,
    pub error: Option<String>,
}

impl MockLlmClient {
    pub fn replying(reply: &str) -> Self {
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            reply: reply.to_string(),
            error: None,
        }
    }

    pub fn failing(error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::replying("")
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn get_requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<Completion> {
        self.requests.lock().unwrap().push(request);

        if let Some(ref error) = self.error {
            return Err(Error::llm(error.clone()));
        }

        Ok(Completion {
            id: "chatcmpl-mock".to_string(),
            model: "gpt-4o-mini".to_string(),
            text: self.reply.clone(),
            finish_reason: Some("Stop".to_string()),
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}

/// Mock policy validator with per-text verdicts; unknown text is accepted unchanged
#[derive(Debug, Clone, Default)]
pub struct MockValidator {
    pub verdicts: Arc<Mutex<HashMap<String, ValidationOutcome>>>,
    pub seen: Arc<Mutex<Vec<String>>>,
    pub error: Option<String>,
}

impl MockValidator {
    pub fn accepting() -> Self {
        Self::default()
    }

    pub fn with_verdict(self, text: &str, outcome: ValidationOutcome) -> Self {
        self.verdicts
            .lock()
            .unwrap()
            .insert(text.to_string(), outcome);
        self
    }

    pub fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl PolicyValidator for MockValidator {
    async fn validate(&self, text: &str) -> Result<ValidationOutcome> {
        self.seen.lock().unwrap().push(text.to_string());

        if let Some(ref error) = self.error {
            return Err(Error::guardrail(error.clone()));
        }

        Ok(self
            .verdicts
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_else(|| ValidationOutcome::accepted(text)))
    }
}

/// Tool runner that replays canned outputs keyed by subcommand
#[derive(Debug, Clone, Default)]
pub struct MockToolRunner {
    pub outputs: Arc<Mutex<HashMap<String, VecDeque<Result<ToolOutput>>>>>,
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockToolRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// `key` is the first argument, e.g. "clippy" or "audit".
    pub fn with_output(self, key: &str, stdout: &str, status_code: i32) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(Ok(ToolOutput {
                status_code: Some(status_code),
                stdout: stdout.to_string(),
                stderr: String::new(),
            }));
        self
    }

    pub fn with_failure(self, key: &str, error: &str) -> Self {
        self.outputs
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(Err(Error::scan(error)));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl ToolRunner for MockToolRunner {
    fn run(&self, program: &str, args: &[&str], _cwd: &Path) -> Result<ToolOutput> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{} {}", program, args.join(" ")));

        let key = args.first().copied().unwrap_or_default();
        self.outputs
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| Err(Error::scan(format!("{} is not installed", program))))
    }
}
