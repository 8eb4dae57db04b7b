use async_trait::async_trait;
use console::style;
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};

use crate::errors::WizardError;
use super::codec;
use super::questions::{Question, QuestionKind, RawAnswer, RawAnswers};
use super::{condition_holds, Prompter};

/// Interactive prompter on the controlling terminal.
pub struct TerminalPrompter {
    editor: Option<DefaultEditor>,
}

impl TerminalPrompter {
    pub fn new() -> Result<Self, WizardError> {
        let config = Config::builder().auto_add_history(false).build();
        let editor = DefaultEditor::with_config(config)
            .map_err(|e| WizardError::Prompt(format!("Failed to initialize terminal: {}", e)))?;
        Ok(Self { editor: Some(editor) })
    }

    async fn read_line(&mut self, prompt: String) -> Result<String, WizardError> {
        let mut editor = self
            .editor
            .take()
            .ok_or_else(|| WizardError::Internal("Terminal editor unavailable".into()))?;

        // rustyline is blocking, so use spawn_blocking
        let (editor, result) = tokio::task::spawn_blocking(move || {
            let result = editor.readline(&prompt);
            (editor, result)
        })
        .await
        .map_err(|e| WizardError::Internal(format!("Readline task failed: {}", e)))?;
        self.editor = Some(editor);

        match result {
            Ok(line) => Ok(line),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                Err(WizardError::Prompt("Aborted by user".into()))
            }
            Err(e) => Err(WizardError::Prompt(e.to_string())),
        }
    }

    async fn ask_one(&mut self, question: &Question) -> Result<RawAnswer, WizardError> {
        println!();
        println!("{}", style(&question.message).bold());

        match &question.kind {
            QuestionKind::Select { choices, default } => {
                for (i, choice) in choices.iter().enumerate() {
                    let marker = if i == *default { style(">").cyan() } else { style(" ") };
                    match &choice.disabled {
                        Some(reason) => println!(
                            "  {} {}) {} {}",
                            marker,
                            i + 1,
                            style(&choice.label).dim(),
                            style(format!("({})", reason)).dim()
                        ),
                        None => println!("  {} {}) {}", marker, i + 1, choice.label),
                    }
                }
                loop {
                    let line = self.read_line(format!("  {} ", style("?").cyan())).await?;
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        return Ok(question.default_answer());
                    }
                    let picked = trimmed
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| choices.get(i));
                    match picked {
                        Some(choice) if choice.disabled.is_none() => {
                            return Ok(RawAnswer::Choice(choice.value.clone()));
                        }
                        Some(_) => println!("  {}", style("That option is not available").yellow()),
                        None => println!("  {}", style("Enter one of the listed numbers").yellow()),
                    }
                }
            }
            QuestionKind::Confirm { default } => {
                let hint = if *default { "Y/n" } else { "y/N" };
                loop {
                    let line = self.read_line(format!("  {} ({}) ", style("?").cyan(), hint)).await?;
                    match line.trim().to_lowercase().as_str() {
                        "" => return Ok(RawAnswer::Confirm(*default)),
                        "y" | "yes" => return Ok(RawAnswer::Confirm(true)),
                        "n" | "no" => return Ok(RawAnswer::Confirm(false)),
                        _ => println!("  {}", style("Please answer y or n").yellow()),
                    }
                }
            }
            QuestionKind::Input { default } => {
                let hint = default
                    .as_deref()
                    .map(|d| format!(" ({})", style(d).dim()))
                    .unwrap_or_default();
                let line = self.read_line(format!("  {}{} ", style("?").cyan(), hint)).await?;
                if line.trim().is_empty() {
                    Ok(question.default_answer())
                } else {
                    Ok(RawAnswer::Text(line.trim().to_string()))
                }
            }
        }
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn ask(&mut self, questions: &[Question]) -> Result<RawAnswers, WizardError> {
        let mut raw = RawAnswers::new();
        for question in questions {
            if !condition_holds(question, &raw) {
                continue;
            }
            tracing::trace!(question = %codec::decode(&question.name), "Prompting");
            let answer = self.ask_one(question).await?;
            raw.insert(question.name.clone(), answer);
        }
        Ok(raw)
    }
}
