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

//! Declarative schema sources
//!
//! Loads function schemas from YAML documents in two shapes:
//!
//! - single: `{function: {name, description, parameters}, function_prompt,
//!   completions_kwargs?}`, one declaration plus the prompt that drives it
//! - bundle: `{functions: [{name, description, parameters}, ...]}`,
//!   declarations only and no prompts
//!
//! A malformed source is skipped with a warning and reported in the
//! [`LoadReport`]; it never aborts the remaining sources.

use crate::error::{ConfigError, ConfigResult};
use crate::registry::SchemaRegistry;
use crate::schema::{CompletionOptions, FunctionSchema};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct SingleDoc {
    function: DeclDoc,
    function_prompt: String,
    #[serde(default)]
    completions_kwargs: Option<CompletionOptions>,
}

#[derive(Debug, Deserialize)]
struct BundleDoc {
    functions: Vec<DeclDoc>,
}

#[derive(Debug, Deserialize)]
struct DeclDoc {
    name: String,
    #[serde(default)]
    description: String,
    parameters: serde_json::Value,
}

impl DeclDoc {
    fn into_schema(
        self,
        prompt: Option<String>,
        options: Option<CompletionOptions>,
    ) -> ConfigResult<FunctionSchema> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if let Some(template) = prompt.as_deref() {
            // Reject templates with broken brace syntax at load time rather
            // than on first invocation.
            crate::template::placeholders(template).map_err(|e| {
                ConfigError::Invalid(format!("Bad prompt template for '{}': {}", self.name, e))
            })?;
        }
        Ok(FunctionSchema {
            name: self.name,
            description: self.description,
            parameters: self.parameters,
            prompt_template: prompt,
            completion_options: options,
        })
    }
}

/// Parse one source document in either supported shape.
pub fn parse_source(content: &str) -> ConfigResult<Vec<FunctionSchema>> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    if value.get("function").is_some() {
        let doc: SingleDoc = serde_yaml::from_value(value)?;
        let schema = doc
            .function
            .into_schema(Some(doc.function_prompt), doc.completions_kwargs)?;
        Ok(vec![schema])
    } else if value.get("functions").is_some() {
        let doc: BundleDoc = serde_yaml::from_value(value)?;
        if doc.functions.is_empty() {
            return Err(ConfigError::Invalid(
                "Bundle declares no functions".to_string(),
            ));
        }
        doc.functions
            .into_iter()
            .map(|decl| decl.into_schema(None, None))
            .collect()
    } else {
        Err(ConfigError::UnknownShape)
    }
}

/// Parse the source file at `path`.
pub fn load_file(path: &Path) -> ConfigResult<Vec<FunctionSchema>> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_source(&content)
}

/// A source file that failed to load
#[derive(Debug)]
pub struct SkippedSource {
    pub path: PathBuf,
    pub error: ConfigError,
}

/// Outcome of a load pass over the configured source directories
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Function names registered by this pass, in load order
    pub loaded: Vec<String>,
    /// Names skipped because an identically-named schema was already registered
    pub duplicates: Vec<String>,
    /// Sources that failed to parse, with their errors
    pub skipped: Vec<SkippedSource>,
}

impl LoadReport {
    /// Whether every source parsed and registered cleanly
    pub fn is_clean(&self) -> bool {
        self.duplicates.is_empty() && self.skipped.is_empty()
    }
}

/// Loads `*.yaml` / `*.yml` schema sources from configured directories into a
/// [`SchemaRegistry`].
#[derive(Debug, Default)]
pub struct SchemaLoader {
    source_dirs: Vec<PathBuf>,
}

impl SchemaLoader {
    /// Create a loader with no source directories
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory to load sources from
    pub fn add_source_dir(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.source_dirs.contains(&path) {
            self.source_dirs.push(path);
        }
    }

    /// Directories this loader scans
    pub fn source_dirs(&self) -> &[PathBuf] {
        &self.source_dirs
    }

    /// Load every source in every configured directory into `registry`.
    ///
    /// Sources within a directory are processed in path order so that
    /// first-registration-wins is deterministic across runs. A source that
    /// fails to parse is skipped and reported; a directory that cannot be
    /// read at all is an error.
    pub fn load_into(&self, registry: &SchemaRegistry) -> ConfigResult<LoadReport> {
        let mut report = LoadReport::default();
        for dir in &self.source_dirs {
            self.load_dir(dir, registry, &mut report)?;
        }
        tracing::info!(
            "Loaded {} function schema(s), {} duplicate(s), {} skipped source(s)",
            report.loaded.len(),
            report.duplicates.len(),
            report.skipped.len()
        );
        Ok(report)
    }

    fn load_dir(
        &self,
        dir: &Path,
        registry: &SchemaRegistry,
        report: &mut LoadReport,
    ) -> ConfigResult<()> {
        let entries = std::fs::read_dir(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ConfigError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if is_source_file(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            match load_file(&path) {
                Ok(schemas) => {
                    for schema in schemas {
                        let name = schema.name.clone();
                        if registry.register(schema) {
                            report.loaded.push(name);
                        } else {
                            tracing::warn!(
                                "Duplicate function '{}' in {}, keeping the first registration",
                                name,
                                path.display()
                            );
                            report.duplicates.push(name);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to load function source {}: {}", path.display(), e);
                    report.skipped.push(SkippedSource { path, error: e });
                }
            }
        }
        Ok(())
    }
}

fn is_source_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SINGLE_SOURCE: &str = r#"
function:
  name: summarize
  description: Summarize a passage of text
  parameters:
    type: object
    properties:
      summary:
        type: string
    required:
      - summary
function_prompt: "Summarize: {text}"
completions_kwargs:
  model: gpt-4
  temperature: 0.2
"#;

    const BUNDLE_SOURCE: &str = r#"
functions:
  - name: classify
    description: Classify a document
    parameters:
      type: object
  - name: extract_entities
    description: Extract named entities
    parameters:
      type: object
"#;

    #[test]
    fn test_parse_single_shape() {
        let schemas = parse_source(SINGLE_SOURCE).unwrap();
        assert_eq!(schemas.len(), 1);

        let schema = &schemas[0];
        assert_eq!(schema.name, "summarize");
        assert_eq!(schema.prompt_template.as_deref(), Some("Summarize: {text}"));
        assert_eq!(schema.parameters["required"], json!(["summary"]));

        let options = schema.completion_options.as_ref().unwrap();
        assert_eq!(options["model"], json!("gpt-4"));
        assert_eq!(options["temperature"], json!(0.2));
    }

    #[test]
    fn test_parse_bundle_shape() {
        let schemas = parse_source(BUNDLE_SOURCE).unwrap();
        assert_eq!(schemas.len(), 2);
        assert_eq!(schemas[0].name, "classify");
        assert_eq!(schemas[1].name, "extract_entities");
        // Bundle entries are declaration-only
        assert!(schemas[0].prompt_template.is_none());
        assert!(schemas[0].completion_options.is_none());
    }

    #[test]
    fn test_parse_unknown_shape() {
        let err = parse_source("something_else: true\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownShape));
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let err = parse_source("function: [unbalanced\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_parse_empty_name() {
        let source = r#"
function:
  name: "  "
  description: blank
  parameters:
    type: object
function_prompt: hello
"#;
        let err = parse_source(source).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyName));
    }

    #[test]
    fn test_parse_bad_template_syntax() {
        let source = r#"
function:
  name: broken
  description: unbalanced brace in prompt
  parameters:
    type: object
function_prompt: "Summarize: {text"
"#;
        let err = parse_source(source).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_empty_bundle() {
        let err = parse_source("functions: []\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_missing_description_defaults_to_empty() {
        let source = r#"
function:
  name: terse
  parameters:
    type: object
function_prompt: "{input}"
"#;
        let schemas = parse_source(source).unwrap();
        assert_eq!(schemas[0].description, "");
    }
}
