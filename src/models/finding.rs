use serde::{Deserialize, Deserializer, Serialize};
use super::decision::AnswerKey;

/// Severity reported by the scanner for a vulnerability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }
}

/// Marks a finding as one of several that share a single remediation.
/// Exactly one member of a group carries `main: true`; the group is asked
/// about once, through that member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouped {
    pub id: String,
    #[serde(default)]
    pub main: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchRef {
    pub id: String,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// A single vulnerability tied to one dependency introduction path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub package_name: String,
    #[serde(default)]
    pub version: String,
    /// Introduction path, root project first, entries formatted `name@version`.
    pub from: Vec<String>,
    /// Parallel to `from`; index 1 is the direct dependency to install.
    #[serde(default, deserialize_with = "de_upgrade_path")]
    pub upgrade_path: Vec<Option<String>>,
    #[serde(default)]
    pub is_upgradable: bool,
    #[serde(default)]
    pub is_patchable: bool,
    #[serde(default)]
    pub patches: Vec<PatchRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouped: Option<Grouped>,
}

impl Finding {
    /// The introduction path without the root node (the project itself).
    pub fn path_tail(&self) -> &[String] {
        self.from.get(1..).unwrap_or(&[])
    }

    /// Policy-style path: `a@1.0.0 > b@2.0.0`.
    pub fn policy_path(&self) -> String {
        self.path_tail().join(" > ")
    }

    pub fn answer_key(&self) -> AnswerKey {
        AnswerKey::new(&self.id, &self.policy_path())
    }

    /// The direct dependency (with version) that resolves this finding, if any.
    pub fn upgrade_target(&self) -> Option<&str> {
        self.upgrade_path.get(1).and_then(|step| step.as_deref())
    }

    pub fn can_update(&self) -> bool {
        self.is_upgradable && self.upgrade_target().is_some()
    }

    pub fn can_patch(&self) -> bool {
        self.is_patchable || !self.patches.is_empty()
    }

    pub fn is_batch_main(&self) -> bool {
        self.grouped.as_ref().map_or(false, |g| g.main)
    }

    /// Non-main member of a group; represented by its group's main finding.
    pub fn is_batch_member(&self) -> bool {
        self.grouped.as_ref().map_or(false, |g| !g.main)
    }
}

/// Scanner output encodes "no upgrade" as `false`.
fn de_upgrade_path<'de, D>(deserializer: D) -> Result<Vec<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            _ => None,
        })
        .collect())
}
