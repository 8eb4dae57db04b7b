//! Question sets for each wizard stage.
//!
//! Every builder here is a pure function of the findings, the prior policy
//! and the answers accumulated so far.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::manifest::ProjectManifest;
use crate::models::{Action, AnswerKey, Answers, Finding};
use crate::policy::PolicyRecord;

pub const START_OVER: &str = "misc-start-over";
pub const AUTH_TOKEN: &str = "misc-auth-token";
pub const ADD_TEST: &str = "misc-add-test";
pub const ADD_PROTECT: &str = "misc-add-protect";
pub const REASON_SUFFIX: &str = "-reason";
pub const EXPIRES_SUFFIX: &str = "-expires";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub value: String,
    pub label: String,
    /// Shown but not selectable; holds the explanation.
    pub disabled: Option<String>,
}

impl Choice {
    pub fn new(action: Action, label: impl Into<String>) -> Self {
        Self {
            value: action.as_str().to_string(),
            label: label.into(),
            disabled: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionKind {
    Select { choices: Vec<Choice>, default: usize },
    Confirm { default: bool },
    Input { default: Option<String> },
}

/// Ask only when an earlier question in the same batch got this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub question: String,
    pub equals: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub name: String,
    pub message: String,
    pub kind: QuestionKind,
    pub when: Option<Condition>,
}

impl Question {
    pub fn confirm(name: &str, message: impl Into<String>, default: bool) -> Self {
        Self {
            name: name.to_string(),
            message: message.into(),
            kind: QuestionKind::Confirm { default },
            when: None,
        }
    }

    pub fn default_answer(&self) -> RawAnswer {
        match &self.kind {
            QuestionKind::Select { choices, default } => RawAnswer::Choice(
                choices
                    .get(*default)
                    .map(|c| c.value.clone())
                    .unwrap_or_else(|| Action::Skip.as_str().to_string()),
            ),
            QuestionKind::Confirm { default } => RawAnswer::Confirm(*default),
            QuestionKind::Input { default } => RawAnswer::Text(default.clone().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawAnswer {
    Choice(String),
    Confirm(bool),
    Text(String),
}

impl RawAnswer {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            RawAnswer::Choice(s) | RawAnswer::Text(s) => Some(s),
            RawAnswer::Confirm(_) => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RawAnswer::Confirm(b) => Some(*b),
            _ => None,
        }
    }
}

/// Answers keyed by question name.
pub type RawAnswers = BTreeMap<String, RawAnswer>;

/// Run-scoped settings that shape the question sets.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub tool: String,
    pub ignore_expiry_days: u32,
    /// Set when authorization denied the ignore capability.
    pub ignore_disabled: Option<String>,
    /// Treat the prior policy as empty (user chose to start over).
    pub ignore_policy: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            tool: crate::config::DEFAULT_TOOL.to_string(),
            ignore_expiry_days: crate::config::DEFAULT_IGNORE_EXPIRY_DAYS,
            ignore_disabled: None,
            ignore_policy: false,
        }
    }
}

/// Questions for one stage plus the findings each decision question covers.
#[derive(Debug, Clone, Default)]
pub struct StagePlan {
    pub questions: Vec<Question>,
    pub targets: BTreeMap<String, Vec<Finding>>,
}

impl StagePlan {
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    fn push_decision(&mut self, question: Question, findings: Vec<Finding>) {
        self.targets.insert(question.name.clone(), findings);
        self.questions.push(question);
    }
}

pub fn auth_token_question(tool: &str) -> Question {
    Question {
        name: AUTH_TOKEN.to_string(),
        message: format!(
            "Not authenticated. Paste your API token (`{} config get api` on an authenticated machine):",
            tool
        ),
        kind: QuestionKind::Input { default: None },
        when: None,
    }
}

pub fn start_over_question() -> Question {
    Question::confirm(
        START_OVER,
        "Ignore the current policy and start over from scratch?",
        false,
    )
}

/// Findings still open for questioning, deduplicated by answer key, in scan order.
fn open_findings<'a>(
    findings: &'a [Finding],
    policy: &PolicyRecord,
    options: &PromptOptions,
) -> Vec<&'a Finding> {
    let mut seen = BTreeSet::new();
    findings
        .iter()
        .filter(|f| options.ignore_policy || !policy.has_rule(&f.id, &f.policy_path()))
        .filter(|f| seen.insert(f.answer_key()))
        .collect()
}

fn describe(finding: &Finding) -> String {
    let via = finding.path_tail().first().map(String::as_str).unwrap_or("the project");
    let mut message = format!(
        "{} severity vulnerability found in {}@{}, introduced via {}",
        capitalize(finding.severity.as_str()),
        finding.package_name,
        finding.version,
        via
    );
    if !finding.title.is_empty() {
        message.push_str(&format!("\n  Description: {}", finding.title));
    }
    if finding.path_tail().len() > 1 {
        message.push_str(&format!("\n  From: {}", finding.path_tail().join(" > ")));
    }
    message
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn update_questions(
    findings: &[Finding],
    policy: &PolicyRecord,
    options: &PromptOptions,
) -> StagePlan {
    let mut plan = StagePlan::default();
    let open = open_findings(findings, policy, options);

    for finding in open.iter().filter(|f| f.can_update() && !f.is_batch_member()) {
        let mut covered = vec![(*finding).clone()];
        let mut message = describe(finding);
        if let Some(group) = finding.grouped.as_ref().filter(|g| g.main) {
            let members: Vec<Finding> = open
                .iter()
                .filter(|f| f.is_batch_member())
                .filter(|f| f.grouped.as_ref().map_or(false, |g| g.id == group.id))
                .map(|f| (*f).clone())
                .collect();
            if !members.is_empty() {
                message.push_str(&format!(
                    "\n  Upgrading also fixes {} other vulnerable path{}",
                    members.len(),
                    if members.len() == 1 { "" } else { "s" }
                ));
            }
            covered.extend(members);
        }

        let target = finding.upgrade_target().unwrap_or_default();
        let question = Question {
            name: finding.answer_key().question_name(),
            message,
            kind: QuestionKind::Select {
                choices: vec![
                    Choice::new(Action::Update, format!("Upgrade to {}", target)),
                    Choice::new(Action::Skip, "Skip"),
                ],
                default: 0,
            },
            when: None,
        };
        plan.push_decision(question, covered);
    }
    plan
}

/// Patchable findings not already slated for update.
pub fn patch_questions(
    findings: &[Finding],
    policy: &PolicyRecord,
    answers: &Answers,
    options: &PromptOptions,
) -> StagePlan {
    let mut plan = StagePlan::default();
    for finding in open_findings(findings, policy, options) {
        if !finding.can_patch() || answers.action_for(finding) == Some(Action::Update) {
            continue;
        }
        let label = match finding.patches.first() {
            Some(patch) => format!("Patch (apply {})", patch.id),
            None => "Patch".to_string(),
        };
        let question = Question {
            name: finding.answer_key().question_name(),
            message: describe(finding),
            kind: QuestionKind::Select {
                choices: vec![Choice::new(Action::Patch, label), Choice::new(Action::Skip, "Skip")],
                default: 0,
            },
            when: None,
        };
        plan.push_decision(question, vec![finding.clone()]);
    }
    plan
}

/// Findings not already slated for update or patch, plus reason/expiry
/// follow-ups asked when ignore is chosen.
pub fn ignore_questions(
    findings: &[Finding],
    policy: &PolicyRecord,
    answers: &Answers,
    options: &PromptOptions,
) -> StagePlan {
    let mut plan = StagePlan::default();
    for finding in open_findings(findings, policy, options) {
        if matches!(answers.action_for(finding), Some(Action::Update) | Some(Action::Patch)) {
            continue;
        }
        let name = finding.answer_key().question_name();
        let mut ignore = Choice::new(
            Action::Ignore,
            format!("Ignore it for {} days", options.ignore_expiry_days),
        );
        ignore.disabled = options.ignore_disabled.clone();
        let default = if ignore.disabled.is_some() { 1 } else { 0 };

        let question = Question {
            name: name.clone(),
            message: describe(finding),
            kind: QuestionKind::Select {
                choices: vec![ignore, Choice::new(Action::Skip, "Skip")],
                default,
            },
            when: None,
        };
        plan.push_decision(question, vec![finding.clone()]);

        let chose_ignore = Some(Condition {
            question: name.clone(),
            equals: Action::Ignore.as_str().to_string(),
        });
        plan.questions.push(Question {
            name: format!("{}{}", name, REASON_SUFFIX),
            message: "[audit] Reason for ignoring vulnerability?".to_string(),
            kind: QuestionKind::Input { default: Some("None given".to_string()) },
            when: chose_ignore.clone(),
        });
        plan.questions.push(Question {
            name: format!("{}{}", name, EXPIRES_SUFFIX),
            message: "Ignore for how long? (days, or a date such as 2030-01-31)".to_string(),
            kind: QuestionKind::Input {
                default: Some(options.ignore_expiry_days.to_string()),
            },
            when: chose_ignore,
        });
    }
    plan
}

/// Follow-up questions about the manifest. A clean scan only offers the test script.
pub fn next_steps_questions(
    manifest: &ProjectManifest,
    scan_ok: bool,
    answers: &Answers,
    tool: &str,
) -> StagePlan {
    let mut plan = StagePlan::default();
    let test_cmd = format!("{} test", tool);
    let runs_test = manifest.script("test").map_or(false, |s| s.contains(&test_cmd));
    if !runs_test {
        plan.questions.push(Question::confirm(
            ADD_TEST,
            format!(
                "Add `{}` to package.json file to fail test on newly disclosed vulnerabilities?",
                test_cmd
            ),
            true,
        ));
    }

    if scan_ok {
        return plan;
    }

    let protect_script = format!("{}-protect", tool);
    let runs_protect = manifest.script(&protect_script).is_some();
    if answers.has_action(Action::Patch) && !runs_protect {
        plan.questions.push(Question::confirm(
            ADD_PROTECT,
            format!(
                "Add `{} protect` as a package.json installation hook to apply chosen patches on install?",
                tool
            ),
            true,
        ));
    }
    plan
}

/// Parse an expiry answer: a number of days, a `YYYY-MM-DD` date or an
/// RFC 3339 timestamp. Empty, unparseable or out-of-range input falls back
/// to the default.
pub fn parse_expiry(input: &str, now: DateTime<Utc>, default_days: u32) -> DateTime<Utc> {
    let trimmed = input.trim();
    if let Some(expiry) = trimmed.parse::<u32>().ok().and_then(|days| days_after(now, days)) {
        return expiry;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return midnight.and_utc();
        }
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return ts.with_timezone(&Utc);
    }
    days_after(now, default_days).unwrap_or(now)
}

fn days_after(now: DateTime<Utc>, days: u32) -> Option<DateTime<Utc>> {
    Duration::try_days(i64::from(days)).and_then(|delta| now.checked_add_signed(delta))
}

/// Split a follow-up name into the decision key it belongs to.
pub fn follow_up_of(name: &str) -> Option<(AnswerKey, &'static str)> {
    for suffix in [REASON_SUFFIX, EXPIRES_SUFFIX] {
        if let Some(base) = name.strip_suffix(suffix) {
            return AnswerKey::parse(base).map(|k| (k, suffix));
        }
    }
    None
}
