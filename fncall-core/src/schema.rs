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

//! Function schema model
//!
//! A [`FunctionSchema`] describes one callable function: the declaration the
//! model sees (name, description, JSON Schema for its arguments), the prompt
//! template used to build the request, and optional per-function generation
//! parameters.

use crate::error::TemplateError;
use serde::{Deserialize, Serialize};

/// Backend-specific generation parameters (model, temperature, max_tokens, ...)
///
/// Kept as an open mapping so new backend parameters pass through without a
/// schema change.
pub type CompletionOptions = serde_json::Map<String, serde_json::Value>;

/// A callable function described declaratively
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionSchema {
    /// Unique function name, used as the registry key
    pub name: String,
    /// Human- and model-facing description of what the function does
    pub description: String,
    /// JSON Schema for the arguments the model must produce
    pub parameters: serde_json::Value,
    /// Prompt template with `{placeholder}` slots; `None` for schemas that
    /// only declare a function without carrying a prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_template: Option<String>,
    /// Generation parameters that replace the process-wide defaults for this
    /// function
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_options: Option<CompletionOptions>,
}

impl FunctionSchema {
    /// Create a declaration-only schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            prompt_template: None,
            completion_options: None,
        }
    }

    /// Attach a prompt template
    pub fn with_prompt_template(mut self, template: impl Into<String>) -> Self {
        self.prompt_template = Some(template.into());
        self
    }

    /// Attach per-function generation parameters
    pub fn with_completion_options(mut self, options: CompletionOptions) -> Self {
        self.completion_options = Some(options);
        self
    }

    /// The subset of the schema advertised to the model
    pub fn declaration(&self) -> FunctionDecl {
        FunctionDecl {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
        }
    }

    /// Render this schema's prompt template with the given arguments.
    ///
    /// Declaration-only schemas (no `prompt_template`) cannot be rendered and
    /// fail with [`TemplateError::NoTemplate`].
    pub fn render_prompt(
        &self,
        args: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<String, TemplateError> {
        let template = self
            .prompt_template
            .as_deref()
            .ok_or_else(|| TemplateError::NoTemplate(self.name.clone()))?;
        crate::template::render(template, args)
    }
}

/// Wire-facing function declaration sent to the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDecl {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}
