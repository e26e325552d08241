//! Capability seam for the two inference models.
//!
//! The summariser and question answerer are opaque capabilities behind
//! traits, so handlers and tests can substitute deterministic stubs for the
//! HTTP-backed implementations.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::inference::InferenceClient;
use crate::summary::LengthBounds;

#[derive(Error, Debug)]
pub enum CapabilityError {
    #[error("inference request failed: {0}")]
    RequestFailed(String),
    #[error("context too short to answer the question")]
    ContextTooShort,
    #[error("failed to parse model response: {0}")]
    ParseError(String),
}

/// An extracted answer with its confidence score.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    pub score: f32,
}

/// Abstractive summarisation capability.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarise `text` within `bounds`, decoding deterministically with
    /// input truncation enabled.
    async fn summarize(&self, text: &str, bounds: LengthBounds) -> Result<String, CapabilityError>;
}

/// Extractive question-answering capability.
#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    /// Extract an answer span for `question` from `context`.
    ///
    /// Returns [`CapabilityError::ContextTooShort`] when the context is too
    /// short or malformed for the question.
    async fn answer(&self, question: &str, context: &str) -> Result<Answer, CapabilityError>;
}

/// The two cached inference capabilities.
///
/// Built once at startup and injected into every handler; user interactions
/// never re-incur construction cost.
#[derive(Clone)]
pub struct ModelProvider {
    pub summarizer: Arc<dyn Summarizer>,
    pub qa: Arc<dyn QuestionAnswerer>,
}

impl ModelProvider {
    /// Build both capabilities over one shared HTTP client.
    pub fn load(config: &Config) -> Result<Self, CapabilityError> {
        let client = InferenceClient::new(&config.inference, config.api.token.clone())
            .map_err(|e| CapabilityError::RequestFailed(e.to_string()))?;
        let client = Arc::new(client);
        Ok(Self {
            summarizer: client.clone(),
            qa: client,
        })
    }

    /// Assemble a provider from explicit capabilities.
    pub fn new(summarizer: Arc<dyn Summarizer>, qa: Arc<dyn QuestionAnswerer>) -> Self {
        Self { summarizer, qa }
    }
}
