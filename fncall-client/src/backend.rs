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

//! Chat backend abstraction
//!
//! A [`ChatBackend`] executes one forced-function chat completion per call.
//! The wire types here are backend-neutral; the OpenAI-compatible HTTP
//! implementation lives in [`crate::openai`].

use crate::error::BackendError;
use async_trait::async_trait;
use fncall_core::{CompletionOptions, FunctionDecl};
use serde::{Deserialize, Serialize};

/// Role of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}

/// Forced function selection: the model must call exactly this function
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForcedFunction {
    pub name: String,
}

/// A single-turn chat request with one declared function and a forced
/// selection of it
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Conversation messages; invocation requests carry exactly one user message
    pub messages: Vec<ChatMessage>,
    /// The one function declared to the model
    pub function: FunctionDecl,
    /// Forced selection naming `function`
    pub function_call: ForcedFunction,
    /// Generation parameters (model, temperature, max_tokens, ...)
    pub options: CompletionOptions,
}

impl ChatRequest {
    /// Build the forced-call request for `function` from a rendered prompt
    pub fn forced_call(
        prompt: impl Into<String>,
        function: FunctionDecl,
        options: CompletionOptions,
    ) -> Self {
        let function_call = ForcedFunction {
            name: function.name.clone(),
        };
        Self {
            messages: vec![ChatMessage::user(prompt)],
            function,
            function_call,
            options,
        }
    }
}

/// The function-call payload of a completion choice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCallPayload {
    /// Function the model chose
    pub name: String,
    /// String-encoded JSON arguments
    pub arguments: String,
}

/// Token accounting reported by the backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// Reply to a [`ChatRequest`]
#[derive(Debug, Clone)]
pub struct ChatReply {
    /// Function call from the first completion choice, if the model produced one
    pub function_call: Option<FunctionCallPayload>,
    /// Token usage, when the backend reports it
    pub usage: Option<TokenUsage>,
}

/// A chat completion backend able to execute forced function calls
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Execute one chat completion request
    async fn complete(&self, request: &ChatRequest) -> Result<ChatReply, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_serialize_lowercase() {
        assert_eq!(serde_json::to_value(ChatRole::User).unwrap(), json!("user"));
        assert_eq!(
            serde_json::to_value(ChatRole::System).unwrap(),
            json!("system")
        );
        assert_eq!(ChatRole::Assistant.as_str(), "assistant");
    }

    #[test]
    fn test_forced_call_shape() {
        let decl = FunctionDecl {
            name: "summarize".into(),
            description: "Summarize text".into(),
            parameters: json!({"type": "object"}),
        };
        let request = ChatRequest::forced_call("Summarize: hello", decl, CompletionOptions::new());

        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, ChatRole::User);
        assert_eq!(request.messages[0].content, "Summarize: hello");
        assert_eq!(request.function_call.name, request.function.name);
    }
}
