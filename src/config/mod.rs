mod types;

pub use types::*;

use crate::{Error, Result};
use std::{env, path::Path};
use tracing::debug;

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Loads the service configuration.
///
/// `CONFIG_PATH` selects the YAML file. When it is unset and `config.yaml`
/// does not exist, built-in defaults are used. Environment overrides are
/// applied afterwards and the result is validated.
pub async fn load() -> Result<Config> {
    let explicit_path = env::var("CONFIG_PATH").ok();
    let config_path = explicit_path
        .clone()
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());

    let mut config = if explicit_path.is_some() || Path::new(&config_path).exists() {
        debug!("Loading configuration from: {}", config_path);
        let config_str = tokio::fs::read_to_string(&config_path).await?;
        from_yaml_str(&config_str)?
    } else {
        debug!("No configuration file found, using defaults");
        Config::default()
    };

    config.apply_env_overrides(|key| env::var(key).ok());
    config.validate()?;

    Ok(config)
}

pub fn from_yaml_str(config_str: &str) -> Result<Config> {
    if config_str.trim().is_empty() {
        return Ok(Config::default());
    }
    Ok(serde_yaml::from_str(config_str)?)
}

impl Config {
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(api_key) = lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.llm.api_key = api_key;
        }
        if let Some(base_url) = lookup("OPENAI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            self.llm.base_url = base_url;
        }
        if let Some(model) = lookup("LLM_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.model = model;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(Error::config(
                "Missing OPENAI_API_KEY (set the environment variable or llm.api_key)",
            ));
        }
        if self.llm.model.trim().is_empty() {
            return Err(Error::config("llm.model must not be empty"));
        }
        if self.llm.max_tokens == 0 {
            return Err(Error::config("llm.max_tokens must be greater than zero"));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::config(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.llm.timeout_secs == 0 {
            return Err(Error::config("llm.timeout_secs must be greater than zero"));
        }
        let threshold = self.guardrails.toxicity.threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::config(format!(
                "guardrails.toxicity.threshold must be within 0.0..=1.0, got {}",
                threshold
            )));
        }
        Ok(())
    }
}
