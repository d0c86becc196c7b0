use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Rule groups keyed by namespace, as returned by a list call.
pub type RuleSet = BTreeMap<String, Vec<RuleGroup>>;

/// A named, ordered collection of rules evaluated together.
///
/// The client never interprets rule contents; groups are only encoded
/// to and decoded from YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    /// Group name, unique within a namespace
    pub name: String,

    /// Evaluation interval (e.g. "1m"); server default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,

    /// Rule definitions in evaluation order
    #[serde(default)]
    pub rules: Vec<Rule>,

    /// Remote write targets for recorded series
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_write: Vec<RemoteWriteConfig>,
}

impl RuleGroup {
    /// Create an empty group with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        RuleGroup {
            name: name.into(),
            interval: None,
            rules: Vec::new(),
            remote_write: Vec::new(),
        }
    }

    /// Set the evaluation interval.
    pub fn with_interval(mut self, interval: impl Into<String>) -> Self {
        self.interval = Some(interval.into());
        self
    }

    /// Append a rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }
}

/// A single alerting or recording rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Series name written by a recording rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<String>,

    /// Alert name for an alerting rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,

    /// Query expression
    pub expr: String,

    /// Pending duration before an alert fires
    #[serde(default, rename = "for", skip_serializing_if = "Option::is_none")]
    pub for_duration: Option<String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl Rule {
    /// Create a recording rule.
    pub fn recording(record: impl Into<String>, expr: impl Into<String>) -> Self {
        Rule {
            record: Some(record.into()),
            expr: expr.into(),
            ..Default::default()
        }
    }

    /// Create an alerting rule.
    pub fn alerting(alert: impl Into<String>, expr: impl Into<String>) -> Self {
        Rule {
            alert: Some(alert.into()),
            expr: expr.into(),
            ..Default::default()
        }
    }

    /// Add a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Returns true if this is an alerting rule.
    pub fn is_alerting(&self) -> bool {
        self.alert.is_some()
    }
}

/// Remote write destination attached to a rule group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteWriteConfig {
    pub url: String,
}

/// Rule groups belonging to one namespace, as stored in rule files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleNamespace {
    pub namespace: String,

    #[serde(default)]
    pub groups: Vec<RuleGroup>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_group_deserialization() {
        let yaml = r#"
name: node_rules
interval: 1m
rules:
  - record: instance:node_cpu:rate5m
    expr: rate(node_cpu_seconds_total[5m])
  - alert: HighCPU
    expr: instance:node_cpu:rate5m > 0.9
    for: 10m
    labels:
      severity: page
    annotations:
      summary: CPU is hot
"#;

        let group: RuleGroup = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(group.name, "node_rules");
        assert_eq!(group.interval.as_deref(), Some("1m"));
        assert_eq!(group.rules.len(), 2);
        assert!(!group.rules[0].is_alerting());
        assert!(group.rules[1].is_alerting());
        assert_eq!(group.rules[1].for_duration.as_deref(), Some("10m"));
        assert_eq!(group.rules[1].labels.get("severity").unwrap(), "page");
        assert!(group.remote_write.is_empty());
    }

    #[test]
    fn test_empty_fields_are_omitted() {
        let group = RuleGroup::new("g").with_rule(Rule::recording("r", "up"));
        let yaml = serde_yaml::to_string(&group).unwrap();

        assert!(!yaml.contains("interval"));
        assert!(!yaml.contains("remote_write"));
        assert!(!yaml.contains("labels"));
        assert!(yaml.contains("record: r"));
    }

    #[test]
    fn test_remote_write_round_trip() {
        let yaml = r#"
name: federated
rules:
  - record: job:up:sum
    expr: sum by (job) (up)
remote_write:
  - url: http://remote-a/api/v1/push
  - url: http://remote-b/api/v1/push
"#;

        let group: RuleGroup = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(group.remote_write.len(), 2);
        assert_eq!(group.remote_write[0].url, "http://remote-a/api/v1/push");
        assert_eq!(group.remote_write[1].url, "http://remote-b/api/v1/push");

        let encoded = serde_yaml::to_string(&group).unwrap();
        assert!(encoded.contains("remote_write:"));
        assert!(encoded.contains("url: http://remote-b/api/v1/push"));

        let decoded: RuleGroup = serde_yaml::from_str(&encoded).unwrap();
        assert_eq!(decoded, group);
    }

    #[test]
    fn test_rule_set_deserialization() {
        let yaml = r#"
team-a:
  - name: g1
    rules: []
team-b:
  - name: g2
    rules:
      - record: r
        expr: up
  - name: g3
"#;

        let set: RuleSet = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set["team-b"].len(), 2);
        assert_eq!(set["team-b"][1].name, "g3");
        assert!(set["team-b"][1].rules.is_empty());
    }
}
