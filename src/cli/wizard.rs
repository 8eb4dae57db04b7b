use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

use crate::config::{is_ci, load_project_config};
use crate::errors::WizardError;
use crate::policy::FilePolicyStore;
use crate::process::{ProcessRunner, TokioProcessRunner};
use crate::prompts::{Prompter, ScriptedPrompter, TerminalPrompter};
use crate::services::{ApiClient, CommandScanner};
use crate::wizard::{run_wizard, Collaborators, WizardOptions, WizardOutcome};
use super::commands::WizardArgs;
use super::resolve_cwd;

/// Version of the installed remediation tool, or empty when unavailable.
async fn tool_version(runner: &dyn ProcessRunner, tool: &str, cwd: &Path) -> String {
    match runner.run(tool, &["--version".to_string()], cwd).await {
        Ok(out) if out.success() => out.stdout.trim().to_string(),
        Ok(out) => {
            debug!(status = out.status, "{} --version failed", tool);
            String::new()
        }
        Err(e) => {
            debug!(error = %e, "{} not available", tool);
            String::new()
        }
    }
}

pub async fn handle_wizard(args: WizardArgs, quiet: bool) -> Result<(), WizardError> {
    let cwd = resolve_cwd(args.cwd.as_deref())?;
    let config = load_project_config(&cwd, args.config.as_deref().map(Path::new)).await?;

    let mut options = WizardOptions::new(cwd.clone()).with_config(&config);
    options.dry_run = args.dry_run;
    options.org = args.org.clone().or(options.org);
    options.file = args.file.clone();
    options.package_manager = args.package_manager.clone();
    options.policy_path = args.policy_path.as_ref().map(PathBuf::from);
    options.ignore_policy = args.ignore_policy;
    options.json = args.json;
    options.ci = options.ci || is_ci();
    options.tap = std::env::var_os("TAP").is_some();
    options.skip_monitor = args.no_monitor;
    options.interactive = args.answers.is_none() && !quiet && console::user_attended();

    let runner: Arc<dyn ProcessRunner> = Arc::new(TokioProcessRunner);
    options.tool_version = tool_version(runner.as_ref(), &options.tool, &cwd).await;

    let prompter: Box<dyn Prompter> = match &args.answers {
        Some(path) => Box::new(ScriptedPrompter::from_file(&cwd.join(path)).await?),
        None => Box::new(TerminalPrompter::new()?),
    };
    let api = ApiClient::new(config.api(), config.token.as_deref());
    let scanner = CommandScanner::new(runner.clone(), &options.tool)
        .with_saved_result(args.scan_result.as_ref().map(PathBuf::from));

    let mut collaborators = Collaborators {
        scanner: Box::new(scanner),
        authenticator: Box::new(api.clone()),
        authorizer: Box::new(api.clone()),
        monitor: Box::new(api),
        policy_store: Box::new(FilePolicyStore),
        runner,
        prompter,
        inspector: None,
    };

    let run_id = Uuid::new_v4();
    let outcome = run_wizard(&options, &mut collaborators)
        .instrument(info_span!("wizard", run_id = %run_id, dry_run = options.dry_run))
        .await?;
    match &outcome {
        WizardOutcome::DryRun { summary } => {
            println!("{}", summary);
        }
        WizardOutcome::Applied { summary } => {
            println!("{}", style(summary).green());
        }
        WizardOutcome::Answers { .. } => println!("{}", outcome.text()),
    }
    Ok(())
}
