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

//! Invocation configuration
//!
//! Loaded from a TOML file or `FNCALL_*` environment variables, with
//! precedence: explicit file > environment > built-in defaults.

use anyhow::{Context, Result};
use fncall_core::CompletionOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration for schema-driven invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend endpoint settings
    #[serde(default)]
    pub backend: BackendConfig,
    /// Retry and default-option settings
    #[serde(default)]
    pub invoker: InvokerConfig,
}

/// Backend endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// OpenAI-compatible endpoint base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer API key; optional for local endpoints
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model used when neither the function schema nor the default options
    /// name one
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

/// Retry and default-option settings for the invoker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokerConfig {
    /// Total attempts per invocation, including the first (must be >= 1)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts, in milliseconds
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Generation parameters applied when a schema declares none of its own
    #[serde(default)]
    pub default_completion_options: CompletionOptions,
}

fn default_base_url() -> String {
    crate::openai::DEFAULT_BASE_URL.to_string()
}

fn default_model() -> String {
    "gpt-4".to_string()
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            model: default_model(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Default for InvokerConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            default_completion_options: CompletionOptions::new(),
        }
    }
}

impl InvokerConfig {
    /// Backoff slept after a failed attempt (1-based): `base * 2^(attempt-1)`
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
            * 2u32.saturating_pow(attempt.saturating_sub(1))
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config: ClientConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Build configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FNCALL_BASE_URL") {
            config.backend.base_url = url;
        }
        if let Ok(key) = std::env::var("FNCALL_API_KEY") {
            config.backend.api_key = Some(key);
        } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.backend.api_key = Some(key);
        }
        if let Ok(model) = std::env::var("FNCALL_MODEL") {
            config.backend.model = model;
        }
        if let Some(secs) = env_parse("FNCALL_REQUEST_TIMEOUT_SECS") {
            config.backend.request_timeout_secs = secs;
        }
        if let Some(attempts) = env_parse("FNCALL_MAX_ATTEMPTS") {
            config.invoker.max_attempts = attempts;
        }
        if let Some(delay) = env_parse("FNCALL_RETRY_BASE_DELAY_MS") {
            config.invoker.retry_base_delay_ms = delay;
        }

        config
    }

    /// Load configuration: explicit file if given, otherwise environment over
    /// defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            tracing::info!("Loading config from file: {:?}", path);
            Self::from_file(&path)
        } else {
            tracing::info!("Using config from environment/defaults");
            let config = Self::from_env();
            config.validate()?;
            Ok(config)
        }
    }

    /// Check configuration invariants
    pub fn validate(&self) -> Result<()> {
        if self.backend.model.trim().is_empty() {
            anyhow::bail!("backend.model must not be empty");
        }
        if !self.backend.base_url.starts_with("http://")
            && !self.backend.base_url.starts_with("https://")
        {
            anyhow::bail!(
                "backend.base_url must be an http(s) URL, got '{}'",
                self.backend.base_url
            );
        }
        if self.backend.request_timeout_secs == 0 {
            anyhow::bail!("backend.request_timeout_secs must be at least 1");
        }
        if self.invoker.max_attempts == 0 {
            anyhow::bail!("invoker.max_attempts must be at least 1");
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
