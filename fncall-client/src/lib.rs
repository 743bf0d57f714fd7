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

//! Fncall Client
//!
//! Forced function-call invocation over OpenAI-compatible chat backends.
//!
//! The [`Invoker`] turns a registered [`fncall_core::FunctionSchema`] plus
//! caller arguments into one chat completion request that declares exactly
//! one function and forces its selection, then decodes the model's
//! string-encoded arguments back into a JSON value.
//!
//! ```rust,ignore
//! let registry = Arc::new(SchemaRegistry::new());
//! let mut loader = SchemaLoader::new();
//! loader.add_source_dir("config/functions");
//! loader.load_into(&registry)?;
//!
//! let config = ClientConfig::load(None)?;
//! let backend = Arc::new(OpenAiBackend::from_config(&config.backend)?);
//! let invoker = Invoker::new(registry, backend, config.invoker);
//!
//! let mut args = serde_json::Map::new();
//! args.insert("text".into(), serde_json::json!("..."));
//! let value = invoker.execute("summarize", &args).await?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod invoker;
pub mod openai;

pub use backend::{
    ChatBackend, ChatMessage, ChatReply, ChatRequest, ChatRole, ForcedFunction,
    FunctionCallPayload, TokenUsage,
};
pub use config::{BackendConfig, ClientConfig, InvokerConfig};
pub use error::{BackendError, InvokeError, InvokeResult, TerminalKind};
pub use invoker::{InvocationResult, Invoker};
pub use openai::OpenAiBackend;
