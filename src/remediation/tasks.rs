use serde::Serialize;

use crate::models::{Action, Answers, Decision, Finding};

/// One remediation step derived from a decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub finding: Finding,
    pub decision: Decision,
}

impl Task {
    /// Introduction path without the root project.
    pub fn path(&self) -> &[String] {
        self.finding.path_tail()
    }

    pub fn policy_path(&self) -> String {
        self.finding.policy_path()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemediationTasks {
    pub update: Vec<Task>,
    pub patch: Vec<Task>,
    pub ignore: Vec<Task>,
}

impl RemediationTasks {
    pub fn is_empty(&self) -> bool {
        self.update.is_empty() && self.patch.is_empty() && self.ignore.is_empty()
    }

    pub fn len(&self) -> usize {
        self.update.len() + self.patch.len() + self.ignore.len()
    }
}

/// Sort every non-skip decision into exactly one task list.
pub fn answers_to_tasks(answers: Answers) -> RemediationTasks {
    let mut tasks = RemediationTasks::default();
    for (_, answer) in answers.iter() {
        let task = Task {
            finding: answer.finding.clone(),
            decision: answer.decision.clone(),
        };
        match answer.decision.action {
            Action::Update => tasks.update.push(task),
            Action::Patch => tasks.patch.push(task),
            Action::Ignore => tasks.ignore.push(task),
            Action::Skip => {}
        }
    }
    tasks
}

/// Analytics view of one decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAnalytics {
    pub vuln_id: String,
    pub choice: Action,
    pub from: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_main: Option<bool>,
}

/// Per-decision analytics; batch flags come from the finding alone.
pub fn answer_analytics(answers: &Answers) -> Vec<AnswerAnalytics> {
    answers
        .iter()
        .map(|(_, answer)| {
            let grouped = answer.finding.grouped.as_ref();
            AnswerAnalytics {
                vuln_id: answer.finding.id.clone(),
                choice: answer.decision.action,
                from: answer.finding.path_tail().to_vec(),
                batch: grouped.map(|_| true),
                batch_main: grouped.map(|g| g.main),
            }
        })
        .collect()
}
