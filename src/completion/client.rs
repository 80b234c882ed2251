use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::models::resolve_model;
use super::types::{CompletionOptions, CompletionRequest, Message, ReplyShape};
use crate::config::{ProviderConfig, RequestConfig};
use crate::error::{CompletionError, CompletionResult};

/// Path of the completion endpoint, relative to the base URL.
pub const COMPLETION_PATH: &str = "/v1/responses";

/// Client for the completion endpoint
#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_ms: Option<u64>,
}

impl CompletionClient {
    /// Create a new completion client
    pub fn new(config: &ProviderConfig, request_config: &RequestConfig) -> CompletionResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout_ms) = request_config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder.build().map_err(CompletionError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: resolve_model(&config.model),
            timeout_ms: request_config.timeout_ms,
        })
    }

    /// Model sent with every request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request a single completion for `messages`.
    ///
    /// Returns `Ok(None)` when the endpoint answered successfully but the body
    /// holds no usable text.
    pub async fn complete(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> CompletionResult<Option<String>> {
        let url = format!("{}{}", self.base_url, COMPLETION_PATH);
        let request =
            CompletionRequest::new(&self.model, messages.to_vec()).with_options(options.clone());

        debug!(
            model = %self.model,
            messages = request.input.len(),
            "Calling completion endpoint"
        );

        let start = Instant::now();
        match self.execute_request(&url, &request).await {
            Ok(reply) => {
                info!(
                    model = %self.model,
                    latency_ms = start.elapsed().as_millis(),
                    has_reply = reply.is_some(),
                    "Completion call succeeded"
                );
                Ok(reply)
            }
            Err(e) => {
                error!(
                    model = %self.model,
                    error = %e,
                    rate_limited = e.is_rate_limited(),
                    latency_ms = start.elapsed().as_millis(),
                    "Completion call failed"
                );
                Err(e)
            }
        }
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        request: &CompletionRequest,
    ) -> CompletionResult<Option<String>> {
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CompletionError::Timeout {
                        timeout_ms: self.timeout_ms.unwrap_or_default(),
                    }
                } else {
                    CompletionError::Http(e)
                }
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::RateLimited { body });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Request {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await.map_err(CompletionError::Http)?;
        Ok(parse_reply(&body))
    }
}

/// Extract reply text from a success body; unusable bodies yield `None`.
pub fn parse_reply(body: &str) -> Option<String> {
    let value: serde_json::Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Completion response is not JSON");
            return None;
        }
    };

    let shape = match ReplyShape::decode(&value) {
        Ok(shape) => shape,
        Err(e) => {
            warn!(error = %e, "Completion response has no readable text");
            return None;
        }
    };

    let text = shape.text();
    if text.trim().is_empty() {
        warn!("Completion response text is empty");
        None
    } else {
        Some(text)
    }
}
