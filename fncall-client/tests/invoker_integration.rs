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

//! Integration tests for the invoker: attempt accounting, retry exemptions,
//! option fallback, and argument decoding against a scripted backend

use async_trait::async_trait;
use fncall_client::{
    BackendError, ChatBackend, ChatReply, ChatRequest, ChatRole, FunctionCallPayload, InvokeError,
    Invoker, InvokerConfig, TokenUsage,
};
use fncall_core::{CompletionOptions, FunctionSchema, SchemaRegistry};
use serde_json::{json, Map, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Backend that replays a scripted sequence of results and records every
/// request it saw
struct ScriptedBackend {
    script: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    fn new(script: Vec<Result<ChatReply, BackendError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, BackendError> {
        self.requests.lock().unwrap().push(request.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(BackendError::Network("script exhausted".to_string())))
    }
}

fn ok_reply(arguments: &str) -> Result<ChatReply, BackendError> {
    Ok(ChatReply {
        function_call: Some(FunctionCallPayload {
            name: "summarize".to_string(),
            arguments: arguments.to_string(),
        }),
        usage: Some(TokenUsage {
            prompt_tokens: 12,
            completion_tokens: 4,
            total_tokens: 16,
        }),
    })
}

fn server_error(status: u16) -> Result<ChatReply, BackendError> {
    Err(BackendError::Server {
        status,
        message: "upstream unhappy".to_string(),
    })
}

fn summarize_schema() -> FunctionSchema {
    FunctionSchema::new(
        "summarize",
        "Summarize a passage of text",
        json!({
            "type": "object",
            "properties": {"summary": {"type": "string"}},
            "required": ["summary"]
        }),
    )
    .with_prompt_template("Summarize: {text}")
}

fn registry_with_summarize() -> Arc<SchemaRegistry> {
    let registry = SchemaRegistry::new();
    registry.register(summarize_schema());
    Arc::new(registry)
}

fn fast_config(max_attempts: u32) -> InvokerConfig {
    InvokerConfig {
        max_attempts,
        retry_base_delay_ms: 1,
        default_completion_options: CompletionOptions::new(),
    }
}

fn text_args() -> Map<String, Value> {
    let mut args = Map::new();
    args.insert("text".to_string(), json!("hello"));
    args
}

/// Happy path: one attempt, decoded arguments, forced-call request shape
#[tokio::test]
async fn test_successful_invocation() {
    let backend = ScriptedBackend::new(vec![ok_reply("{\"summary\": \"short\"}")]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(3));

    let value = invoker.execute("summarize", &text_args()).await.unwrap();
    assert_eq!(value, json!({"summary": "short"}));
    assert_eq!(backend.calls(), 1);

    let request = backend.last_request().unwrap();
    assert_eq!(request.messages.len(), 1);
    assert_eq!(request.messages[0].role, ChatRole::User);
    assert_eq!(request.messages[0].content, "Summarize: hello");
    assert_eq!(request.function.name, "summarize");
    assert_eq!(request.function_call.name, "summarize");
}

/// Usage metadata and the attempt count ride along when asked for
#[tokio::test]
async fn test_usage_metadata_reported() {
    let backend = ScriptedBackend::new(vec![ok_reply("{\"summary\": \"s\"}")]);
    let invoker = Invoker::new(registry_with_summarize(), backend, fast_config(3));

    let result = invoker
        .execute_with_usage("summarize", &text_args())
        .await
        .unwrap();
    assert_eq!(result.attempts, 1);
    let usage = result.usage.unwrap();
    assert_eq!(usage.prompt_tokens, 12);
    assert_eq!(usage.total_tokens, 16);
}

/// An authentication failure is terminal: exactly one attempt, no retries
#[tokio::test]
async fn test_auth_failure_is_not_retried() {
    let backend = ScriptedBackend::new(vec![Err(BackendError::Auth("bad key".to_string()))]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(5));

    let err = invoker.execute("summarize", &text_args()).await.unwrap_err();
    match err {
        InvokeError::Backend {
            function,
            attempts,
            source,
        } => {
            assert_eq!(function, "summarize");
            assert_eq!(attempts, 1);
            assert!(matches!(source, BackendError::Auth(_)));
        }
        other => panic!("expected Backend error, got {other:?}"),
    }
    assert_eq!(backend.calls(), 1);
}

/// Permission and malformed-request failures are terminal too
#[tokio::test]
async fn test_other_terminal_failures_are_not_retried() {
    for source in [
        BackendError::Permission("org blocked".to_string()),
        BackendError::InvalidRequest("unknown model".to_string()),
    ] {
        let backend = ScriptedBackend::new(vec![Err(source)]);
        let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(5));

        let err = invoker.execute("summarize", &text_args()).await.unwrap_err();
        assert!(matches!(err, InvokeError::Backend { attempts: 1, .. }));
        assert_eq!(backend.calls(), 1);
    }
}

/// Transient failures on the first two attempts, success on the third
#[tokio::test]
async fn test_transient_failures_then_success() {
    let backend = ScriptedBackend::new(vec![
        server_error(500),
        Err(BackendError::Network("connection reset".to_string())),
        ok_reply("{\"summary\": \"third time\"}"),
    ]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(3));

    let result = invoker
        .execute_with_usage("summarize", &text_args())
        .await
        .unwrap();
    assert_eq!(result.arguments, json!({"summary": "third time"}));
    assert_eq!(result.attempts, 3);
    assert_eq!(backend.calls(), 3);
}

/// Exhausting the ceiling makes exactly `max_attempts` attempts and wraps
/// the final failure
#[tokio::test]
async fn test_retry_ceiling_wraps_last_failure() {
    let backend = ScriptedBackend::new(vec![
        server_error(500),
        server_error(502),
        server_error(503),
        server_error(504),
    ]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(3));

    let err = invoker.execute("summarize", &text_args()).await.unwrap_err();
    match err {
        InvokeError::Backend {
            attempts, source, ..
        } => {
            assert_eq!(attempts, 3);
            // The wrapped failure is the one from the final attempt
            assert!(matches!(source, BackendError::Server { status: 503, .. }));
        }
        other => panic!("expected Backend error, got {other:?}"),
    }
    assert_eq!(backend.calls(), 3);
}

/// A server-provided Retry-After delay is honored between attempts
#[tokio::test]
async fn test_rate_limit_retry_after_honored() {
    let backend = ScriptedBackend::new(vec![
        Err(BackendError::RateLimited(Some(Duration::from_millis(20)))),
        ok_reply("{\"summary\": \"after backoff\"}"),
    ]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(3));

    let start = Instant::now();
    let result = invoker
        .execute_with_usage("summarize", &text_args())
        .await
        .unwrap();
    assert_eq!(result.attempts, 2);
    assert!(start.elapsed() >= Duration::from_millis(20));
}

/// An unregistered name fails before any backend contact
#[tokio::test]
async fn test_unknown_function_never_contacts_backend() {
    let backend = ScriptedBackend::new(vec![ok_reply("{}")]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(3));

    let err = invoker.execute("nonexistent", &text_args()).await.unwrap_err();
    assert!(matches!(
        err,
        InvokeError::NotFound { function } if function == "nonexistent"
    ));
    assert_eq!(backend.calls(), 0);
}

/// A missing template argument fails before any backend contact
#[tokio::test]
async fn test_template_failure_never_contacts_backend() {
    let backend = ScriptedBackend::new(vec![ok_reply("{}")]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(3));

    let err = invoker.execute("summarize", &Map::new()).await.unwrap_err();
    assert!(matches!(err, InvokeError::Template { .. }));
    assert_eq!(backend.calls(), 0);
}

/// Declaration-only schemas (no prompt template) cannot be executed
#[tokio::test]
async fn test_declaration_only_schema_rejected() {
    let registry = SchemaRegistry::new();
    registry.register(FunctionSchema::new(
        "lookup",
        "Declaration only",
        json!({"type": "object"}),
    ));
    let backend = ScriptedBackend::new(vec![ok_reply("{}")]);
    let invoker = Invoker::new(Arc::new(registry), backend.clone(), fast_config(3));

    let err = invoker.execute("lookup", &Map::new()).await.unwrap_err();
    assert!(matches!(err, InvokeError::Template { .. }));
    assert_eq!(backend.calls(), 0);
}

/// Per-function options replace the defaults wholesale; schemas without
/// options fall back to the defaults
#[tokio::test]
async fn test_completion_option_fallback() {
    let mut defaults = CompletionOptions::new();
    defaults.insert("model".to_string(), json!("default-model"));
    defaults.insert("temperature".to_string(), json!(0.7));

    let mut schema_options = CompletionOptions::new();
    schema_options.insert("model".to_string(), json!("per-function-model"));

    let registry = SchemaRegistry::new();
    registry.register(summarize_schema().with_completion_options(schema_options.clone()));
    registry.register(
        FunctionSchema::new("classify", "Classify text", json!({"type": "object"}))
            .with_prompt_template("Classify: {text}"),
    );

    let config = InvokerConfig {
        max_attempts: 1,
        retry_base_delay_ms: 1,
        default_completion_options: defaults.clone(),
    };
    let backend = ScriptedBackend::new(vec![ok_reply("{}"), ok_reply("{}")]);
    let invoker = Invoker::new(Arc::new(registry), backend.clone(), config);

    invoker.execute("summarize", &text_args()).await.unwrap();
    let request = backend.last_request().unwrap();
    // Wholesale replacement: no temperature inherited from the defaults
    assert_eq!(request.options, schema_options);

    invoker.execute("classify", &text_args()).await.unwrap();
    let request = backend.last_request().unwrap();
    assert_eq!(request.options, defaults);
}

/// An explicit schema bypasses the registry without mutating it
#[tokio::test]
async fn test_execute_schema_override() {
    let registry = Arc::new(SchemaRegistry::new());
    let backend = ScriptedBackend::new(vec![ok_reply("{\"summary\": \"ad hoc\"}")]);
    let invoker = Invoker::new(registry.clone(), backend.clone(), fast_config(3));

    let value = invoker
        .execute_schema(&summarize_schema(), &text_args())
        .await
        .unwrap();
    assert_eq!(value, json!({"summary": "ad hoc"}));
    assert!(registry.is_empty());
}

/// Unparseable arguments surface as a decode failure, not a retry
#[tokio::test]
async fn test_unparseable_arguments() {
    let backend = ScriptedBackend::new(vec![ok_reply("definitely not json")]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(3));

    let err = invoker.execute("summarize", &text_args()).await.unwrap_err();
    assert!(matches!(
        err,
        InvokeError::Decode { function, .. } if function == "summarize"
    ));
    assert_eq!(backend.calls(), 1);
}

/// A reply with no function call at all surfaces as a decode-stage failure
#[tokio::test]
async fn test_reply_without_function_call() {
    let backend = ScriptedBackend::new(vec![Ok(ChatReply {
        function_call: None,
        usage: None,
    })]);
    let invoker = Invoker::new(registry_with_summarize(), backend.clone(), fast_config(3));

    let err = invoker.execute("summarize", &text_args()).await.unwrap_err();
    assert!(matches!(err, InvokeError::MissingFunctionCall { .. }));
    assert_eq!(backend.calls(), 1);
}
