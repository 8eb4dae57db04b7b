use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::errors::WizardError;
use crate::manifest::ProjectManifest;
use crate::models::{Action, Answers, Decision, Finding};
use crate::policy::PolicyRecord;
use super::codec;
use super::questions::{
    auth_token_question, ignore_questions, next_steps_questions, parse_expiry, patch_questions, start_over_question,
    update_questions, Condition, PromptOptions, Question, RawAnswer, RawAnswers, StagePlan,
    ADD_PROTECT, ADD_TEST, AUTH_TOKEN, EXPIRES_SUFFIX, REASON_SUFFIX, START_OVER,
};
use super::Prompter;

const SHRINKWRAP_FILE: &str = "npm-shrinkwrap.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Update,
    Patch,
    Ignore,
    NextSteps,
    Done,
}

impl Stage {
    pub fn next(self) -> Self {
        match self {
            Self::Update => Self::Patch,
            Self::Patch => Self::Ignore,
            Self::Ignore => Self::NextSteps,
            Self::NextSteps | Self::Done => Self::Done,
        }
    }
}

/// Everything the question builders read; fixed for the whole run.
pub struct PipelineContext<'a> {
    pub findings: &'a [Finding],
    pub policy: &'a PolicyRecord,
    pub manifest: &'a ProjectManifest,
    pub scan_ok: bool,
    pub options: &'a PromptOptions,
    pub cwd: &'a Path,
    pub now: DateTime<Utc>,
}

impl PipelineContext<'_> {
    fn plan(&self, stage: Stage, answers: &Answers) -> StagePlan {
        match stage {
            Stage::Update => update_questions(self.findings, self.policy, self.options),
            Stage::Patch => patch_questions(self.findings, self.policy, answers, self.options),
            Stage::Ignore => ignore_questions(self.findings, self.policy, answers, self.options),
            Stage::NextSteps => {
                next_steps_questions(self.manifest, self.scan_ok, answers, &self.options.tool)
            }
            Stage::Done => StagePlan::default(),
        }
    }
}

/// Ask through the prompter with flat-safe names, then restore them.
async fn ask_encoded(
    prompter: &mut dyn Prompter,
    questions: &[Question],
) -> Result<RawAnswers, WizardError> {
    let encoded: Vec<Question> = questions
        .iter()
        .map(|q| Question {
            name: codec::encode(&q.name),
            when: q.when.as_ref().map(|c| Condition {
                question: codec::encode(&c.question),
                equals: c.equals.clone(),
            }),
            ..q.clone()
        })
        .collect();
    let mut raw = prompter.ask(&encoded).await?;
    codec::restore(&mut raw)?;
    Ok(raw)
}

fn text_answer(raw: &RawAnswers, name: &str) -> Option<String> {
    raw.get(name)
        .and_then(RawAnswer::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn record_decisions(
    stage: Stage,
    plan: &StagePlan,
    raw: &RawAnswers,
    answers: &mut Answers,
    ctx: &PipelineContext<'_>,
) {
    for (name, covered) in &plan.targets {
        let Some(choice) = raw.get(name).and_then(RawAnswer::as_str) else {
            continue;
        };
        let Some(mut action) = Action::parse(choice) else {
            warn!(question = %name, choice, "Unknown choice, treating as skip");
            continue;
        };
        if action == Action::Ignore && ctx.options.ignore_disabled.is_some() {
            warn!(question = %name, "Ignore is not permitted, treating as skip");
            action = Action::Skip;
        }

        let decision = if stage == Stage::Ignore && action == Action::Ignore {
            let reason = text_answer(raw, &format!("{}{}", name, REASON_SUFFIX));
            let expires = text_answer(raw, &format!("{}{}", name, EXPIRES_SUFFIX)).unwrap_or_default();
            Decision::ignore(
                reason,
                Some(parse_expiry(&expires, ctx.now, ctx.options.ignore_expiry_days)),
            )
        } else {
            Decision::new(action)
        };

        for finding in covered {
            answers.insert(finding.clone(), decision.clone());
        }
    }
}

fn record_next_steps(raw: &RawAnswers, answers: &mut Answers) {
    let flag = |name: &str| raw.get(name).and_then(RawAnswer::as_bool).unwrap_or(false);
    answers.misc.add_test = flag(ADD_TEST);
    answers.misc.add_protect = flag(ADD_PROTECT);
}

/// Run the Update, Patch, Ignore and NextSteps stages in order.
pub async fn run_pipeline(
    prompter: &mut dyn Prompter,
    ctx: &PipelineContext<'_>,
) -> Result<Answers, WizardError> {
    let mut answers = Answers::new();
    let mut stage = Stage::Update;

    while stage != Stage::Done {
        let plan = ctx.plan(stage, &answers);
        if plan.is_empty() {
            debug!(?stage, "No questions for stage");
        } else {
            let raw = ask_encoded(prompter, &plan.questions).await?;
            match stage {
                Stage::NextSteps => record_next_steps(&raw, &mut answers),
                _ => record_decisions(stage, &plan, &raw, &mut answers, ctx),
            }
            debug!(?stage, answered = answers.len(), "Stage complete");
        }
        stage = stage.next();
    }

    if ctx.cwd.join(SHRINKWRAP_FILE).exists() {
        answers.misc.build_shrinkwrap = true;
    }
    Ok(answers)
}

/// The optional opening question; `true` means discard the prior policy.
pub async fn ask_start_over(prompter: &mut dyn Prompter) -> Result<bool, WizardError> {
    let raw = prompter.ask(&[start_over_question()]).await?;
    Ok(raw.get(START_OVER).and_then(RawAnswer::as_bool).unwrap_or(false))
}

/// Ask for an API token; `None` when the answer is blank.
pub async fn ask_auth_token(prompter: &mut dyn Prompter, tool: &str) -> Result<Option<String>, WizardError> {
    let raw = prompter.ask(&[auth_token_question(tool)]).await?;
    Ok(raw
        .get(AUTH_TOKEN)
        .and_then(RawAnswer::as_str)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string))
}
