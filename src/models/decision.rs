use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::finding::Finding;

/// Separates the vulnerability id from the path in a flat question name.
const KEY_SEPARATOR: char = '|';

/// Composite answer key: one finding id on one introduction path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnswerKey {
    pub id: String,
    pub path: String,
}

impl AnswerKey {
    pub fn new(id: &str, path: &str) -> Self {
        Self {
            id: id.to_string(),
            path: path.to_string(),
        }
    }

    /// Flat question name for prompting, e.g. `npm:ms:20170412|debug@2.2.0 > ms@0.7.1`.
    pub fn question_name(&self) -> String {
        format!("{}{}{}", self.id, KEY_SEPARATOR, self.path)
    }

    pub fn parse(name: &str) -> Option<Self> {
        let (id, path) = name.split_once(KEY_SEPARATOR)?;
        if id.is_empty() {
            return None;
        }
        Some(Self::new(id, path))
    }
}

impl fmt::Display for AnswerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.id, self.path)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Update,
    Patch,
    Ignore,
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Patch => "patch",
            Self::Ignore => "ignore",
            Self::Skip => "skip",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "update" => Some(Self::Update),
            "patch" => Some(Self::Patch),
            "ignore" => Some(Self::Ignore),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: Action,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl Decision {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            reason: None,
            expires: None,
        }
    }

    pub fn ignore(reason: Option<String>, expires: Option<DateTime<Utc>>) -> Self {
        Self {
            action: Action::Ignore,
            reason,
            expires,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub finding: Finding,
    pub decision: Decision,
}

/// Answers to the non-vulnerability questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MiscFlags {
    pub start_over: bool,
    pub add_test: bool,
    pub add_protect: bool,
    pub skip_monitor: bool,
    pub build_shrinkwrap: bool,
}

/// Running accumulator filled by the prompt stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Answers {
    decisions: BTreeMap<AnswerKey, Answer>,
    pub misc: MiscFlags,
}

impl Answers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decision; an exact key collision overwrites (last write wins).
    pub fn insert(&mut self, finding: Finding, decision: Decision) {
        self.decisions.insert(finding.answer_key(), Answer { finding, decision });
    }

    pub fn get(&self, key: &AnswerKey) -> Option<&Answer> {
        self.decisions.get(key)
    }

    pub fn action_for(&self, finding: &Finding) -> Option<Action> {
        self.decisions.get(&finding.answer_key()).map(|a| a.decision.action)
    }

    pub fn has_action(&self, action: Action) -> bool {
        self.decisions.values().any(|a| a.decision.action == action)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AnswerKey, &Answer)> {
        self.decisions.iter()
    }

    pub fn len(&self) -> usize {
        self.decisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decisions.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &AnswerKey> {
        self.decisions.keys()
    }
}
