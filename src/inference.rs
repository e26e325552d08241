//! HTTP client for the hosted inference API.
//!
//! Speaks the pipeline-style JSON contract: summarisation posts raw text
//! with generation parameters and gets back a list of candidate summaries;
//! question answering posts a question/context pair and gets back an answer
//! span with a confidence score.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::InferenceConfig;
use crate::models::{Answer, CapabilityError, QuestionAnswerer, Summarizer};
use crate::summary::LengthBounds;

/// User-Agent string identifying this client
const USER_AGENT: &str = concat!("condensa/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct SummarizationRequest<'a> {
    inputs: &'a str,
    parameters: SummarizationParameters,
}

/// Generation parameters for the summarisation pipeline. Decoding is always
/// deterministic and over-long inputs are always truncated.
#[derive(Debug, Serialize)]
struct SummarizationParameters {
    min_length: u32,
    max_length: u32,
    do_sample: bool,
    truncation: bool,
}

#[derive(Debug, Deserialize)]
struct SummarizationOutput {
    summary_text: String,
}

#[derive(Debug, Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
}

#[derive(Debug, Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Debug, Deserialize)]
struct QaOutput {
    answer: String,
    score: f32,
}

/// Error body returned by the API on non-success statuses.
#[derive(Debug, Deserialize)]
struct ApiError {
    error: String,
}

/// Client for both model routes of the inference API.
pub struct InferenceClient {
    http: Client,
    endpoint: String,
    summarization_model: String,
    qa_model: String,
    token: Option<String>,
}

impl InferenceClient {
    /// Create a configured client. The underlying connection pool is shared
    /// by both model routes.
    pub fn new(config: &InferenceConfig, token: Option<String>) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            summarization_model: config.summarization_model.clone(),
            qa_model: config.qa_model.clone(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.endpoint, model)
    }

    async fn post_json<T: Serialize>(
        &self,
        model: &str,
        body: &T,
    ) -> Result<(StatusCode, String), CapabilityError> {
        let mut request = self.http.post(self.model_url(model)).json(body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| CapabilityError::RequestFailed(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| CapabilityError::RequestFailed(e.to_string()))?;
        Ok((status, text))
    }

    /// Extract the API's error message from a response body, falling back to
    /// the raw body when it is not the expected JSON shape.
    fn api_message(body: &str) -> String {
        serde_json::from_str::<ApiError>(body)
            .map(|e| e.error)
            .unwrap_or_else(|_| body.trim().to_string())
    }
}

#[async_trait]
impl Summarizer for InferenceClient {
    async fn summarize(&self, text: &str, bounds: LengthBounds) -> Result<String, CapabilityError> {
        let request = SummarizationRequest {
            inputs: text,
            parameters: SummarizationParameters {
                min_length: bounds.min_length,
                max_length: bounds.max_length,
                do_sample: false,
                truncation: true,
            },
        };
        tracing::debug!(
            model = %self.summarization_model,
            min_length = bounds.min_length,
            max_length = bounds.max_length,
            "summarization request"
        );
        let (status, body) = self.post_json(&self.summarization_model, &request).await?;
        if !status.is_success() {
            return Err(CapabilityError::RequestFailed(format!(
                "{}: {}",
                status,
                Self::api_message(&body)
            )));
        }
        let outputs: Vec<SummarizationOutput> = serde_json::from_str(&body)
            .map_err(|e| CapabilityError::ParseError(e.to_string()))?;
        outputs
            .into_iter()
            .next()
            .map(|o| o.summary_text)
            .ok_or_else(|| CapabilityError::ParseError("empty summarization response".to_string()))
    }
}

#[async_trait]
impl QuestionAnswerer for InferenceClient {
    async fn answer(&self, question: &str, context: &str) -> Result<Answer, CapabilityError> {
        let request = QaRequest {
            inputs: QaInputs { question, context },
        };
        tracing::debug!(model = %self.qa_model, "question-answering request");
        let (status, body) = self.post_json(&self.qa_model, &request).await?;
        // The QA model rejects a context it cannot process with 400.
        if status == StatusCode::BAD_REQUEST {
            tracing::debug!(message = %Self::api_message(&body), "context rejected");
            return Err(CapabilityError::ContextTooShort);
        }
        if !status.is_success() {
            return Err(CapabilityError::RequestFailed(format!(
                "{}: {}",
                status,
                Self::api_message(&body)
            )));
        }
        let output: QaOutput = serde_json::from_str(&body)
            .map_err(|e| CapabilityError::ParseError(e.to_string()))?;
        Ok(Answer {
            text: output.answer,
            score: output.score,
        })
    }
}
