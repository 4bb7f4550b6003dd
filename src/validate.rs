//! Advisory format validation for prompt record files.
//!
//! Used by authoring workflows and the loader's test suite. Deliberately
//! more lenient than the runtime loader: it checks structure, not metadata
//! shape, and reports findings as human-readable issue strings instead of
//! errors. An empty issue list means the file is valid.

use std::fs;
use std::path::Path;

use serde_yaml::Value;

/// Top-level fields every record file must declare.
const REQUIRED_FIELDS: [&str; 3] = ["name", "template", "category"];

/// Validates a record file on disk. Returns an ordered list of issues;
/// empty means valid.
pub fn validate_format(path: impl AsRef<Path>) -> Vec<String> {
    let content = match fs::read_to_string(path.as_ref()) {
        Ok(content) => content,
        Err(e) => return vec![format!("Cannot read file: {}", e)],
    };
    validate_format_str(&content)
}

/// Validates raw record text. Returns an ordered list of issues; empty
/// means valid.
pub fn validate_format_str(content: &str) -> Vec<String> {
    let value: Value = match serde_yaml::from_str(content) {
        Ok(value) => value,
        Err(e) => return vec![format!("Invalid YAML: {}", e)],
    };

    let Some(mapping) = value.as_mapping() else {
        return vec!["Root element must be a mapping".to_string()];
    };

    let mut issues = Vec::new();

    for field in REQUIRED_FIELDS {
        if !mapping.contains_key(field) {
            issues.push(format!("Missing required field: {}", field));
        }
    }

    if let Some(template) = mapping.get("template") {
        let text = template.as_str().unwrap_or("");
        if text.trim().is_empty() {
            issues.push("Template is empty".to_string());
        }
    }

    if let Some(parameters) = mapping.get("parameters").and_then(Value::as_sequence) {
        for (i, param) in parameters.iter().enumerate() {
            let has_name = param
                .as_mapping()
                .map(|m| m.contains_key("name"))
                .unwrap_or(false);
            if !has_name {
                issues.push(format!("Parameter {} missing 'name'", i));
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_record_has_no_issues() {
        let yaml = r#"
name: executive_summary
category: summarization
template: "Summarize: {document}"
parameters:
  - name: document
"#;
        assert!(validate_format_str(yaml).is_empty());
    }

    #[test]
    fn test_unparseable_yaml_single_issue() {
        let issues = validate_format_str("{unclosed: [\n");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Invalid YAML"));
    }

    #[test]
    fn test_non_mapping_root() {
        let issues = validate_format_str("- just\n- a\n- list\n");
        assert_eq!(issues, vec!["Root element must be a mapping".to_string()]);
    }

    #[test]
    fn test_missing_required_fields_one_issue_each() {
        let issues = validate_format_str("description: no core fields here\n");
        assert_eq!(
            issues,
            vec![
                "Missing required field: name".to_string(),
                "Missing required field: template".to_string(),
                "Missing required field: category".to_string(),
            ]
        );
    }

    #[test]
    fn test_whitespace_only_template() {
        let yaml = "name: x\ncategory: misc\ntemplate: \"   \"\n";
        assert_eq!(validate_format_str(yaml), vec!["Template is empty".to_string()]);
    }

    #[test]
    fn test_parameter_entries_missing_name_reported_by_position() {
        let yaml = r#"
name: x
category: misc
template: "Body {a}"
parameters:
  - name: a
  - type: string
  - description: also nameless
"#;
        assert_eq!(
            validate_format_str(yaml),
            vec![
                "Parameter 1 missing 'name'".to_string(),
                "Parameter 2 missing 'name'".to_string(),
            ]
        );
    }

    #[test]
    fn test_unreadable_path_reports_issue() {
        let issues = validate_format("/definitely/not/a/real/path.yaml");
        assert_eq!(issues.len(), 1);
        assert!(issues[0].starts_with("Cannot read file"));
    }
}
