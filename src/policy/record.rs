use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::WizardError;

pub const POLICY_VERSION: &str = "v1.25.0";
const HEADER: &str =
    "# Snyk (https://snyk.io) policy file, patches or ignores known vulnerabilities.";

/// Per-path metadata attached to a rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patched: Option<DateTime<Utc>>,
    /// Keys written by other tools (`source`, `ignoredBy`, ...), kept as-is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

/// One introduction path a rule applies to. Serialized as a single-entry
/// mapping, `'a@1 > b@2': { reason: ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<String, Option<RuleMeta>>",
    into = "BTreeMap<String, Option<RuleMeta>>"
)]
pub struct PathRule {
    pub path: String,
    pub meta: RuleMeta,
}

impl TryFrom<BTreeMap<String, Option<RuleMeta>>> for PathRule {
    type Error = String;

    fn try_from(map: BTreeMap<String, Option<RuleMeta>>) -> Result<Self, Self::Error> {
        if map.len() != 1 {
            return Err(format!("expected exactly one path per rule entry, found {}", map.len()));
        }
        let (path, meta) = map.into_iter().next().ok_or("empty rule entry")?;
        Ok(PathRule {
            path,
            meta: meta.unwrap_or_default(),
        })
    }
}

impl From<PathRule> for BTreeMap<String, Option<RuleMeta>> {
    fn from(rule: PathRule) -> Self {
        let mut map = BTreeMap::new();
        map.insert(rule.path, Some(rule.meta));
        map
    }
}

impl PathRule {
    /// Whether this rule covers the given introduction path.
    pub fn matches(&self, path: &str) -> bool {
        self.path == "*" || self.path == path
    }
}

pub type RuleSet = BTreeMap<String, Vec<PathRule>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    /// Where the record was loaded from or last saved to.
    #[serde(skip)]
    pub filename: Option<PathBuf>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ignore: RuleSet,
    #[serde(default)]
    pub patch: RuleSet,
    /// Top-level sections the wizard does not manage (`exclude`, ...).
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn default_version() -> String {
    POLICY_VERSION.to_string()
}

impl PolicyRecord {
    /// A fresh, empty policy. `created` is stamped now and never changes.
    pub fn create() -> Self {
        Self {
            filename: None,
            version: default_version(),
            created: Some(Utc::now()),
            modified: None,
            ignore: RuleSet::new(),
            patch: RuleSet::new(),
            extra: BTreeMap::new(),
        }
    }

    pub fn parse(text: &str) -> Result<Self, WizardError> {
        if text.trim().is_empty() {
            let mut policy = Self::create();
            policy.created = None;
            return Ok(policy);
        }
        serde_yaml::from_str(text)
            .map_err(|e| WizardError::Policy(format!("Invalid policy file: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, WizardError> {
        let body = serde_yaml::to_string(self)?;
        Ok(format!("{}\n{}", HEADER, body))
    }

    pub fn is_empty(&self) -> bool {
        self.ignore.is_empty() && self.patch.is_empty()
    }

    pub fn has_rule(&self, id: &str, path: &str) -> bool {
        [&self.ignore, &self.patch].iter().any(|set| {
            set.get(id)
                .map_or(false, |rules| rules.iter().any(|r| r.matches(path)))
        })
    }

    pub fn add_ignore(
        &mut self,
        id: &str,
        path: &str,
        reason: Option<String>,
        expires: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) {
        let meta = RuleMeta {
            reason,
            expires,
            created: Some(now),
            patched: None,
            extra: BTreeMap::new(),
        };
        upsert(&mut self.ignore, id, path, meta);
    }

    pub fn add_patch(&mut self, id: &str, path: &str, now: DateTime<Utc>) {
        let meta = RuleMeta {
            patched: Some(now),
            ..Default::default()
        };
        upsert(&mut self.patch, id, path, meta);
    }
}

/// Replace the entry for `path` under `id`, or append it.
fn upsert(set: &mut RuleSet, id: &str, path: &str, meta: RuleMeta) {
    let rules = set.entry(id.to_string()).or_default();
    let rule = PathRule {
        path: path.to_string(),
        meta,
    };
    match rules.iter_mut().find(|r| r.path == path) {
        Some(existing) => *existing = rule,
        None => rules.push(rule),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SAMPLE: &str = r#"# Snyk (https://snyk.io) policy file
version: v1.25.0
ignore:
  'npm:ms:20170412':
    - 'debug@2.2.0 > ms@0.7.1':
        reason: no fix yet
        expires: '2030-01-01T00:00:00Z'
patch:
  'npm:qs:20170213':
    - 'express@4.0.0 > qs@1.0.0':
        patched: '2024-01-01T00:00:00Z'
    - '*':
"#;

    #[test]
    fn test_parse_sample() {
        let policy = PolicyRecord::parse(SAMPLE).unwrap();
        assert_eq!(policy.ignore.len(), 1);
        let rule = &policy.ignore["npm:ms:20170412"][0];
        assert_eq!(rule.path, "debug@2.2.0 > ms@0.7.1");
        assert_eq!(rule.meta.reason.as_deref(), Some("no fix yet"));
        assert_eq!(policy.patch["npm:qs:20170213"].len(), 2);
        assert!(policy.created.is_none());
    }

    #[test]
    fn test_has_rule_and_wildcard() {
        let policy = PolicyRecord::parse(SAMPLE).unwrap();
        assert!(policy.has_rule("npm:ms:20170412", "debug@2.2.0 > ms@0.7.1"));
        assert!(!policy.has_rule("npm:ms:20170412", "other@1.0.0 > ms@0.7.1"));
        assert!(policy.has_rule("npm:qs:20170213", "anything"));
    }

    #[test]
    fn test_upsert_replaces_same_path() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut policy = PolicyRecord::create();
        policy.add_ignore("v1", "a@1", Some("first".into()), None, now);
        policy.add_ignore("v1", "a@1", Some("second".into()), None, now);
        policy.add_ignore("v1", "b@1", None, None, now);
        let rules = &policy.ignore["v1"];
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].meta.reason.as_deref(), Some("second"));
    }

    #[test]
    fn test_yaml_has_header_and_reparses() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let mut policy = PolicyRecord::create();
        policy.add_patch("v1", "a@1 > b@2", now);
        let text = policy.to_yaml().unwrap();
        assert!(text.starts_with("# Snyk"));
        let parsed = PolicyRecord::parse(&text).unwrap();
        assert_eq!(parsed.patch, policy.patch);
        assert_eq!(parsed.created, policy.created);
    }

    #[test]
    fn test_rule_entry_with_two_paths_is_rejected() {
        let text = "patch:\n  v1:\n    - a: {}\n      b: {}\n";
        assert!(PolicyRecord::parse(text).is_err());
    }

    #[test]
    fn test_empty_text_is_empty_policy() {
        let policy = PolicyRecord::parse("  \n").unwrap();
        assert!(policy.is_empty());
    }
}
