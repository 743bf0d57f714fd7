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

//! Fncall Core
//!
//! Schema model, registry, declarative sources, and prompt templating for
//! LLM function calling.
//!
//! - [`FunctionSchema`] describes one callable function
//! - [`SchemaRegistry`] maps function names to schemas (first registration
//!   wins, safe for concurrent use)
//! - [`SchemaLoader`] fills a registry from YAML source directories
//! - [`template::render`] substitutes `{placeholder}` slots in prompts

pub mod error;
pub mod loader;
pub mod registry;
pub mod schema;
pub mod template;

pub use error::{ConfigError, ConfigResult, TemplateError};
pub use loader::{LoadReport, SchemaLoader, SkippedSource};
pub use registry::SchemaRegistry;
pub use schema::{CompletionOptions, FunctionDecl, FunctionSchema};
