pub mod codec;
pub mod questions;
pub mod pipeline;
pub mod scripted;
pub mod terminal;

use async_trait::async_trait;

use crate::errors::WizardError;

pub use pipeline::{ask_auth_token, ask_start_over, run_pipeline, PipelineContext, Stage};
pub use questions::{
    Choice, Condition, PromptOptions, Question, QuestionKind, RawAnswer, RawAnswers, StagePlan,
};
pub use scripted::ScriptedPrompter;
pub use terminal::TerminalPrompter;

/// Asks a batch of questions and returns answers keyed by question name.
///
/// A question whose `when` condition does not hold must be left unanswered.
#[async_trait]
pub trait Prompter: Send {
    async fn ask(&mut self, questions: &[Question]) -> Result<RawAnswers, WizardError>;
}

/// Whether `question` should be asked given the answers so far in its batch.
pub fn condition_holds(question: &Question, answered: &RawAnswers) -> bool {
    match &question.when {
        None => true,
        Some(cond) => answered
            .get(&cond.question)
            .and_then(RawAnswer::as_str)
            .map_or(false, |v| v == cond.equals),
    }
}
