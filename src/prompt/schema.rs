//! Schema definitions for prompt records.
//!
//! A record file is a YAML mapping with top-level fields `name`, `version`,
//! `category`, `description`, `template`, `parameters`, `metadata`, and
//! `examples`. Every field except `name` carries a default so that sparse
//! files still parse.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default recommended model for records that do not specify one.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-lite";

/// A declared template parameter.
///
/// If `required` is true and no default is set, the parameter must be
/// supplied at render time or rendering fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptParameter {
    /// Parameter name, unique within a record.
    pub name: String,
    /// Declared type tag (free-form, e.g. "string").
    #[serde(rename = "type", default = "default_type")]
    pub param_type: String,
    /// Whether the parameter must be supplied (or defaulted) at render time.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Optional default value substituted when the parameter is not supplied.
    #[serde(default)]
    pub default: Option<String>,
}

impl PromptParameter {
    /// Creates a required parameter with the given name.
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: default_type(),
            required: true,
            description: String::new(),
            default: None,
        }
    }

    /// Creates an optional parameter with the given name.
    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name)
        }
    }

    /// Sets the default value for this parameter.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// A sample invocation of a record.
///
/// No invariant ties example inputs to declared parameters; mismatches are
/// tolerated by both the loader and the test harness.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PromptExample {
    /// Parameter name to sample value.
    #[serde(default)]
    pub input: BTreeMap<String, String>,
    /// Substrings expected to appear in generated output.
    #[serde(default)]
    pub expected_output_contains: Vec<String>,
    /// Exact expected output, if any.
    #[serde(default)]
    pub expected_output: Option<String>,
}

/// Generation metadata for a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMetadata {
    /// Recommended model identifier.
    #[serde(default = "default_model")]
    pub recommended_model: String,
    /// Expected token budget for a typical response.
    #[serde(default = "default_expected_tokens")]
    pub expected_tokens: u32,
    /// Sampling temperature, conventionally 0.0-1.0.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Free-text tags. Insertion order is preserved for display; matching
    /// is order-independent.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Optional hard cap on output tokens.
    #[serde(default)]
    pub max_tokens: Option<u32>,
}

impl Default for PromptMetadata {
    fn default() -> Self {
        Self {
            recommended_model: default_model(),
            expected_tokens: default_expected_tokens(),
            temperature: default_temperature(),
            tags: Vec::new(),
            max_tokens: None,
        }
    }
}

/// One named template definition with parameters, metadata, and examples.
///
/// Constructed once at load time by parsing a single YAML file; immutable
/// thereafter. The library cache owns records and hands out read-only views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique identifier within the library. Last-loaded wins on collision.
    pub name: String,
    /// Version string.
    #[serde(default = "default_version")]
    pub version: String,
    /// Category string used for grouping and filtering.
    #[serde(default = "default_category")]
    pub category: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Template text containing `{param}`-style placeholders.
    #[serde(default)]
    pub template: String,
    /// Declared parameters, in declaration order.
    #[serde(default)]
    pub parameters: Vec<PromptParameter>,
    /// Generation metadata.
    #[serde(default)]
    pub metadata: PromptMetadata,
    /// Sample invocations, in declaration order.
    #[serde(default)]
    pub examples: Vec<PromptExample>,
    /// Originating file, set by the loader. Not part of the file format.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Prompt {
    /// Creates a minimal record with the given name, category, and template.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        template: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: default_version(),
            category: category.into(),
            description: String::new(),
            template: template.into(),
            parameters: Vec::new(),
            metadata: PromptMetadata::default(),
            examples: Vec::new(),
            source_path: None,
        }
    }

    /// Adds a declared parameter.
    pub fn with_parameter(mut self, parameter: PromptParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Adds an example.
    pub fn with_example(mut self, example: PromptExample) -> Self {
        self.examples.push(example);
        self
    }
}

fn default_type() -> String {
    "string".to_string()
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_expected_tokens() -> u32 {
    500
}

fn default_temperature() -> f64 {
    0.7
}

fn default_version() -> String {
    "1.0".to_string()
}

fn default_category() -> String {
    "uncategorized".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_record_parses_with_defaults() {
        let yaml = "name: greeting\ntemplate: \"Hello, {who}!\"\n";
        let prompt: Prompt = serde_yaml::from_str(yaml).expect("should parse");

        assert_eq!(prompt.name, "greeting");
        assert_eq!(prompt.version, "1.0");
        assert_eq!(prompt.category, "uncategorized");
        assert_eq!(prompt.metadata.recommended_model, DEFAULT_MODEL);
        assert_eq!(prompt.metadata.expected_tokens, 500);
        assert!((prompt.metadata.temperature - 0.7).abs() < f64::EPSILON);
        assert!(prompt.parameters.is_empty());
        assert!(prompt.examples.is_empty());
    }

    #[test]
    fn test_record_without_name_fails_to_parse() {
        let yaml = "template: \"Hello\"\ncategory: misc\n";
        let result: Result<Prompt, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err(), "name is the one mandatory field");
    }

    #[test]
    fn test_parameter_defaults() {
        let yaml = "name: doc\n";
        let param: PromptParameter = serde_yaml::from_str(yaml).expect("should parse");

        assert_eq!(param.param_type, "string");
        assert!(param.required);
        assert!(param.default.is_none());
        assert!(param.description.is_empty());
    }

    #[test]
    fn test_full_record_parses() {
        let yaml = r#"
name: executive_summary
version: "2.1"
category: summarization
description: Summarize a document for executives
template: "Summarize: {document}"
parameters:
  - name: document
    type: string
    required: true
    description: The document to summarize
metadata:
  recommended_model: gemini-2.5-flash-lite
  expected_tokens: 300
  temperature: 0.3
  tags: [business, summary]
  max_tokens: 1024
examples:
  - input:
      document: "Quarterly revenue grew 12%."
    expected_output_contains: [revenue]
"#;
        let prompt: Prompt = serde_yaml::from_str(yaml).expect("should parse");

        assert_eq!(prompt.version, "2.1");
        assert_eq!(prompt.parameters.len(), 1);
        assert_eq!(prompt.metadata.max_tokens, Some(1024));
        assert_eq!(prompt.metadata.tags, vec!["business", "summary"]);
        assert_eq!(prompt.examples[0].expected_output_contains, vec!["revenue"]);
    }
}
