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

//! Error types for schema sources and prompt templates

use std::path::PathBuf;
use thiserror::Error;

/// Result type for schema-source operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading declarative function sources
#[derive(Debug, Error)]
pub enum ConfigError {
    // File errors
    #[error("Failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Document errors
    #[error("Failed to parse function source: {0}")]
    Parse(String),

    #[error("Function source has neither a 'function' nor a 'functions' section")]
    UnknownShape,

    #[error("Function source declares an empty function name")]
    EmptyName,

    #[error("Invalid function source: {0}")]
    Invalid(String),
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        ConfigError::Parse(e.to_string())
    }
}

/// Errors raised while rendering a prompt template
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Template references '{{{0}}}' but no argument named '{0}' was provided")]
    MissingKey(String),

    #[error("Template has an unmatched brace at byte {0}")]
    Unclosed(usize),

    #[error("Function '{0}' declares no prompt template")]
    NoTemplate(String),
}
