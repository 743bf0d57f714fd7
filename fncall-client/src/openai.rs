// Copyright 2025 Fncall Contributors (https://github.com/fncall-rs/fncall)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! OpenAI-compatible chat completion backend
//!
//! Talks to any endpoint implementing the OpenAI `/chat/completions` API
//! (OpenAI itself, Azure OpenAI, vLLM, ...). Requests always declare exactly
//! one function and force its selection; replies surface the first choice's
//! function call and the reported token usage.

use crate::backend::{ChatBackend, ChatReply, ChatRequest, FunctionCallPayload, TokenUsage};
use crate::config::BackendConfig;
use crate::error::BackendError;
use async_trait::async_trait;
use std::time::Duration;

/// Default OpenAI API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default per-request timeout; requests never wait unboundedly
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI-compatible HTTP backend
pub struct OpenAiBackend {
    base_url: String,
    api_key: Option<String>,
    model: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl OpenAiBackend {
    /// Create a backend targeting the default OpenAI endpoint
    pub fn new(model: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .pool_max_idle_per_host(10)
            .build()
            .map_err(|e| BackendError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            model: model.into(),
            timeout: DEFAULT_TIMEOUT,
            client,
        })
    }

    /// Build a backend from configuration
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        let mut backend = Self::new(&config.model)?
            .with_base_url(&config.base_url)
            .with_timeout(Duration::from_secs(config.request_timeout_secs));
        if let Some(key) = &config.api_key {
            backend = backend.with_api_key(key);
        }
        Ok(backend)
    }

    /// Set the bearer API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Point at a different OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Model used when the request options carry no `model` override
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": self.model,
            "messages": request.messages,
            "functions": [request.function],
            "function_call": request.function_call,
        });
        // Per-function options are splatted over the base body, so an
        // options-level "model" wins.
        if let Some(map) = body.as_object_mut() {
            for (key, value) in &request.options {
                map.insert(key.clone(), value.clone());
            }
        }
        body
    }
}

#[async_trait]
impl ChatBackend for OpenAiBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        let body = self.request_body(request);

        let mut http_request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body)
            .timeout(self.timeout);

        if let Some(api_key) = &self.api_key {
            http_request = http_request.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Timeout(self.timeout)
            } else {
                BackendError::Network(e.to_string())
            }
        })?;

        let status = response.status();

        // Rate limiting, with the server-suggested delay when present
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(BackendError::RateLimited(retry_after));
        }

        // Terminal statuses
        if status == reqwest::StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Auth(body));
        }
        if status == reqwest::StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Permission(body));
        }
        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::NOT_FOUND
            || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY
        {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::InvalidRequest(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        // Everything else non-2xx is treated as transient
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BackendError::Server {
                status: status.as_u16(),
                message: body,
            });
        }

        let reply: serde_json::Value = response
            .json()
            .await
            .map_err(|e| BackendError::Protocol(format!("Failed to parse reply: {}", e)))?;

        extract_reply(&reply)
    }
}

fn extract_reply(value: &serde_json::Value) -> Result<ChatReply, BackendError> {
    let call = &value["choices"][0]["message"]["function_call"];
    let function_call = if call.is_null() {
        None
    } else {
        let name = call["name"].as_str().unwrap_or_default().to_string();
        let arguments = call["arguments"]
            .as_str()
            .ok_or_else(|| {
                BackendError::Protocol("function_call arguments are not a string".to_string())
            })?
            .to_string();
        Some(FunctionCallPayload { name, arguments })
    };

    let usage = value
        .get("usage")
        .filter(|u| !u.is_null())
        .map(|usage_data| TokenUsage {
            prompt_tokens: usage_data["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: usage_data["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: usage_data["total_tokens"].as_u64().unwrap_or(0) as u32,
        });

    Ok(ChatReply {
        function_call,
        usage,
    })
}
