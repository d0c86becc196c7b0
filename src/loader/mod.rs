use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::domain::RuleNamespace;

/// Errors that can occur while loading rule files.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Load a rule namespace from a YAML file.
///
/// Expected format:
///
/// ```yaml
/// namespace: team-a
/// groups:
///   - name: node_rules
///     rules: [...]
/// ```
pub fn load_rule_file(path: impl AsRef<Path>) -> Result<RuleNamespace, LoadError> {
    let content = fs::read_to_string(path)?;
    parse_rule_namespace(&content)
}

/// Parse a rule namespace from YAML text.
pub fn parse_rule_namespace(content: &str) -> Result<RuleNamespace, LoadError> {
    let namespace: RuleNamespace = serde_yaml::from_str(content)?;

    validate_namespace(&namespace)?;

    Ok(namespace)
}

/// Load several rule files, rejecting a namespace defined twice.
pub fn load_rule_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<RuleNamespace>, LoadError> {
    let mut seen = HashSet::new();
    let mut namespaces = Vec::with_capacity(paths.len());

    for path in paths {
        let namespace = load_rule_file(path)?;
        if !seen.insert(namespace.namespace.clone()) {
            return Err(LoadError::Validation(format!(
                "Namespace {} defined in more than one file",
                namespace.namespace
            )));
        }
        namespaces.push(namespace);
    }

    Ok(namespaces)
}

fn validate_namespace(namespace: &RuleNamespace) -> Result<(), LoadError> {
    if namespace.namespace.is_empty() {
        return Err(LoadError::Validation(
            "Namespace cannot be empty".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    for group in &namespace.groups {
        if group.name.is_empty() {
            return Err(LoadError::Validation(format!(
                "Rule group without a name in namespace {}",
                namespace.namespace
            )));
        }
        if !seen_names.insert(&group.name) {
            return Err(LoadError::Validation(format!(
                "Duplicate rule group name: {}",
                group.name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn test_load_rule_file() {
        let file = write_file(
            r#"
namespace: team-a
groups:
  - name: node_rules
    interval: 30s
    rules:
      - record: instance:node_cpu:rate5m
        expr: rate(node_cpu_seconds_total[5m])
  - name: alerts
    rules:
      - alert: HighCPU
        expr: instance:node_cpu:rate5m > 0.9
        for: 5m
"#,
        );

        let namespace = load_rule_file(file.path()).unwrap();

        assert_eq!(namespace.namespace, "team-a");
        assert_eq!(namespace.groups.len(), 2);
        assert_eq!(namespace.groups[0].interval.as_deref(), Some("30s"));
        assert_eq!(namespace.groups[1].rules[0].alert.as_deref(), Some("HighCPU"));
    }

    #[test]
    fn test_empty_namespace_rejected() {
        let file = write_file(
            r#"
namespace: ""
groups: []
"#,
        );

        let result = load_rule_file(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Namespace"));
    }

    #[test]
    fn test_duplicate_group_names_rejected() {
        let file = write_file(
            r#"
namespace: team-a
groups:
  - name: g1
  - name: g1
"#,
        );

        let result = load_rule_file(file.path());
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn test_missing_file() {
        let result = load_rule_file("/nonexistent/rules.yaml");
        assert!(matches!(result, Err(LoadError::Io(_))));
    }

    #[test]
    fn test_invalid_yaml() {
        let result = parse_rule_namespace("namespace: [unterminated");
        assert!(matches!(result, Err(LoadError::Yaml(_))));
    }

    #[test]
    fn test_load_rule_files_duplicate_namespace() {
        let a = write_file("namespace: team-a\ngroups:\n  - name: g1");
        let b = write_file("namespace: team-a\ngroups:\n  - name: g2");

        let result = load_rule_files(&[a.path(), b.path()]);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("more than one file"));
    }

    #[test]
    fn test_load_rule_files() {
        let a = write_file("namespace: team-a\ngroups:\n  - name: g1");
        let b = write_file("namespace: team-b\ngroups:\n  - name: g1");

        let namespaces = load_rule_files(&[a.path(), b.path()]).unwrap();
        assert_eq!(namespaces.len(), 2);
        assert_eq!(namespaces[1].namespace, "team-b");
    }
}
