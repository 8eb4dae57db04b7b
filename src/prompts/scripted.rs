use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::WizardError;
use crate::models::{Action, AnswerKey};
use super::codec;
use super::questions::{follow_up_of, Question, QuestionKind, RawAnswer, RawAnswers};
use super::{condition_holds, Prompter};

/// Answers supplied up front, for automation and tests.
///
/// A question is matched by its full decoded name, then by vulnerability id
/// (`"npm:ms:20170412": "ignore"`, `"npm:ms:20170412-reason": "..."`).
/// Unmatched selections skip; unmatched confirms and inputs take the
/// question default.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    answers: BTreeMap<String, Value>,
}

impl ScriptedPrompter {
    pub fn new(answers: BTreeMap<String, Value>) -> Self {
        Self { answers }
    }

    pub fn from_value(value: &Value) -> Result<Self, WizardError> {
        let map = value
            .as_object()
            .ok_or_else(|| WizardError::Prompt("Scripted answers must be a JSON object".into()))?;
        Ok(Self::new(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()))
    }

    pub async fn from_file(path: &Path) -> Result<Self, WizardError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            WizardError::Prompt(format!("Failed to read answers {}: {}", path.display(), e))
        })?;
        Self::from_value(&serde_json::from_str(&text)?)
    }

    fn lookup(&self, decoded: &str) -> Option<&Value> {
        if let Some(v) = self.answers.get(decoded) {
            return Some(v);
        }
        if let Some((key, suffix)) = follow_up_of(decoded) {
            return self.answers.get(&format!("{}{}", key.id, suffix));
        }
        AnswerKey::parse(decoded).and_then(|key| self.answers.get(&key.id))
    }

    fn answer(&self, question: &Question, decoded: &str) -> RawAnswer {
        let scripted = self.lookup(decoded);
        match &question.kind {
            QuestionKind::Select { choices, .. } => {
                let selectable = |value: &str| {
                    choices.iter().any(|c| c.value == value && c.disabled.is_none())
                };
                match scripted.and_then(Value::as_str) {
                    Some(value) if selectable(value) => RawAnswer::Choice(value.to_string()),
                    _ if selectable(Action::Skip.as_str()) => {
                        RawAnswer::Choice(Action::Skip.as_str().to_string())
                    }
                    _ => question.default_answer(),
                }
            }
            QuestionKind::Confirm { .. } => match scripted.and_then(Value::as_bool) {
                Some(b) => RawAnswer::Confirm(b),
                None => question.default_answer(),
            },
            QuestionKind::Input { .. } => match scripted {
                Some(Value::String(s)) => RawAnswer::Text(s.clone()),
                Some(Value::Number(n)) => RawAnswer::Text(n.to_string()),
                _ => question.default_answer(),
            },
        }
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&mut self, questions: &[Question]) -> Result<RawAnswers, WizardError> {
        let mut raw = RawAnswers::new();
        for question in questions {
            if !condition_holds(question, &raw) {
                continue;
            }
            let decoded = codec::decode(&question.name);
            let answer = self.answer(question, &decoded);
            debug!(question = %decoded, ?answer, "Scripted answer");
            raw.insert(question.name.clone(), answer);
        }
        Ok(raw)
    }
}
