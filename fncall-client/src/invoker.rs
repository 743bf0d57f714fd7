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

//! Schema-driven function invocation
//!
//! An [`Invoker`] resolves a registered schema, renders its prompt with the
//! caller's arguments, sends one forced function-call request per attempt,
//! and decodes the arguments string out of the reply. Terminal backend
//! failures (auth, permission, malformed request) are returned after the
//! first attempt; everything else retries with bounded exponential backoff.

use crate::backend::{ChatBackend, ChatReply, ChatRequest, TokenUsage};
use crate::config::InvokerConfig;
use crate::error::{BackendError, InvokeError, InvokeResult};
use fncall_core::{FunctionSchema, SchemaRegistry};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Outcome of one invocation, with attempt accounting and usage metadata
#[derive(Debug, Clone)]
pub struct InvocationResult {
    /// Decoded arguments the model produced for the function
    pub arguments: Value,
    /// Token usage, when the backend reported it
    pub usage: Option<TokenUsage>,
    /// Backend attempts made, including the successful one
    pub attempts: u32,
}

/// Executes registered functions against a chat backend
pub struct Invoker {
    registry: Arc<SchemaRegistry>,
    backend: Arc<dyn ChatBackend>,
    config: InvokerConfig,
}

impl Invoker {
    /// Create an invoker over `registry` and `backend`
    pub fn new(
        registry: Arc<SchemaRegistry>,
        backend: Arc<dyn ChatBackend>,
        config: InvokerConfig,
    ) -> Self {
        Self {
            registry,
            backend,
            config,
        }
    }

    /// Execute the registered function `name` with `args`, returning the
    /// decoded arguments value
    pub async fn execute(&self, name: &str, args: &Map<String, Value>) -> InvokeResult<Value> {
        Ok(self.execute_with_usage(name, args).await?.arguments)
    }

    /// Execute the registered function `name` with `args`, returning usage
    /// and attempt metadata alongside the decoded value
    pub async fn execute_with_usage(
        &self,
        name: &str,
        args: &Map<String, Value>,
    ) -> InvokeResult<InvocationResult> {
        let schema = self.registry.get(name).ok_or_else(|| InvokeError::NotFound {
            function: name.to_string(),
        })?;
        self.execute_schema_with_usage(&schema, args).await
    }

    /// Execute an explicit schema without consulting the registry
    pub async fn execute_schema(
        &self,
        schema: &FunctionSchema,
        args: &Map<String, Value>,
    ) -> InvokeResult<Value> {
        Ok(self.execute_schema_with_usage(schema, args).await?.arguments)
    }

    /// Execute an explicit schema, returning usage and attempt metadata
    pub async fn execute_schema_with_usage(
        &self,
        schema: &FunctionSchema,
        args: &Map<String, Value>,
    ) -> InvokeResult<InvocationResult> {
        tracing::info!("Executing AI function: {}", schema.name);

        let prompt = schema
            .render_prompt(args)
            .map_err(|source| InvokeError::Template {
                function: schema.name.clone(),
                source,
            })?;
        tracing::debug!(
            "Rendered prompt for '{}' ({} chars)",
            schema.name,
            prompt.len()
        );

        // A schema's own options replace the defaults wholesale; the two are
        // not merged key by key.
        let options = schema
            .completion_options
            .clone()
            .unwrap_or_else(|| self.config.default_completion_options.clone());

        let request = ChatRequest::forced_call(prompt, schema.declaration(), options);
        let (reply, attempts) = self.dispatch(&schema.name, &request).await?;
        let arguments = decode_arguments(&schema.name, &reply)?;

        tracing::debug!(
            "Function '{}' succeeded after {} attempt(s)",
            schema.name,
            attempts
        );

        Ok(InvocationResult {
            arguments,
            usage: reply.usage,
            attempts,
        })
    }

    async fn dispatch(
        &self,
        function: &str,
        request: &ChatRequest,
    ) -> InvokeResult<(ChatReply, u32)> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error: Option<BackendError> = None;

        for attempt in 1..=max_attempts {
            match self.backend.complete(request).await {
                Ok(reply) => return Ok((reply, attempt)),
                Err(err) => {
                    if let Some(kind) = err.terminal_kind() {
                        tracing::error!(
                            "Function '{}' hit a {} failure on attempt {}: {}",
                            function,
                            kind.as_str(),
                            attempt,
                            err
                        );
                        return Err(InvokeError::Backend {
                            function: function.to_string(),
                            attempts: attempt,
                            source: err,
                        });
                    }

                    tracing::warn!(
                        "Function '{}' attempt {}/{} failed: {}",
                        function,
                        attempt,
                        max_attempts,
                        err
                    );
                    if attempt < max_attempts {
                        let delay = err
                            .retry_after()
                            .unwrap_or_else(|| self.config.backoff_delay(attempt));
                        tokio::time::sleep(delay).await;
                    }
                    last_error = Some(err);
                }
            }
        }

        Err(InvokeError::Backend {
            function: function.to_string(),
            attempts: max_attempts,
            source: last_error
                .unwrap_or_else(|| BackendError::Network("no attempt was made".to_string())),
        })
    }
}

fn decode_arguments(function: &str, reply: &ChatReply) -> InvokeResult<Value> {
    let call = reply
        .function_call
        .as_ref()
        .ok_or_else(|| InvokeError::MissingFunctionCall {
            function: function.to_string(),
        })?;
    serde_json::from_str(&call.arguments).map_err(|source| InvokeError::Decode {
        function: function.to_string(),
        source,
    })
}
