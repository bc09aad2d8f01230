pub mod config;
pub mod error;
pub mod guardrails;
pub mod llm;
pub mod pipeline;
pub mod scan;
pub mod server;

pub use error::{Error, Result};
