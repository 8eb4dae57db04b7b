use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::{WizardConfig, DEFAULT_IGNORE_EXPIRY_DAYS, DEFAULT_POLICY_FILE, DEFAULT_TOOL};
use crate::errors::WizardError;
use crate::manifest::{ProjectManifest, MANIFEST_FILE};
use crate::package_manager::{detect_package_manager, detect_target_file};
use crate::policy::{policy_path, synthesize, PolicyStore};
use crate::process::ProcessRunner;
use crate::progress::ProgressScope;
use crate::prompts::{ask_auth_token, ask_start_over, run_pipeline, PipelineContext, PromptOptions, Prompter};
use crate::remediation::{answer_analytics, answers_to_tasks};
use crate::services::{
    load_inspector, Authenticator, Authorizer, ModuleInspector, Monitor, ScanOptions, Scanner,
    IGNORE_ACTION,
};
use super::banner::show_banner;
use super::coordinator::SideEffects;
use super::summary::{applied_summary, dry_run_summary};

/// Run-scoped settings, resolved from flags, config and environment.
#[derive(Debug, Clone)]
pub struct WizardOptions {
    /// Project directory; every path is resolved against it.
    pub cwd: PathBuf,
    pub dry_run: bool,
    pub org: Option<String>,
    pub file: Option<String>,
    pub package_manager: Option<String>,
    pub policy_path: Option<PathBuf>,
    /// Ask about findings even when the policy already has a rule for them.
    pub ignore_policy: bool,
    /// Return the answers instead of applying them.
    pub json: bool,
    pub ci: bool,
    /// Running under a TAP test harness; git staging is skipped.
    pub tap: bool,
    pub skip_monitor: bool,
    pub tool: String,
    pub tool_version: String,
    pub policy_file: String,
    pub ignore_expiry_days: u32,
    pub app_url: String,
    pub interactive: bool,
}

impl WizardOptions {
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            dry_run: false,
            org: None,
            file: None,
            package_manager: None,
            policy_path: None,
            ignore_policy: false,
            json: false,
            ci: false,
            tap: false,
            skip_monitor: false,
            tool: DEFAULT_TOOL.to_string(),
            tool_version: String::new(),
            policy_file: DEFAULT_POLICY_FILE.to_string(),
            ignore_expiry_days: DEFAULT_IGNORE_EXPIRY_DAYS,
            app_url: WizardConfig::default().app_url(),
            interactive: false,
        }
    }

    /// Fill from project configuration; values already set on `self` win.
    pub fn with_config(mut self, config: &WizardConfig) -> Self {
        if self.org.is_none() {
            self.org = config.org.clone();
        }
        self.tool = config.tool().to_string();
        self.policy_file = config.policy_file().to_string();
        self.ignore_expiry_days = config.ignore_expiry_days();
        self.app_url = config.app_url();
        self.ci = self.ci || config.ci.unwrap_or(false);
        self
    }
}

/// How a wizard run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum WizardOutcome {
    Applied { summary: String },
    DryRun { summary: String },
    Answers { json: Value },
}

impl WizardOutcome {
    pub fn text(&self) -> String {
        match self {
            Self::Applied { summary } | Self::DryRun { summary } => summary.clone(),
            Self::Answers { json } => serde_json::to_string_pretty(json).unwrap_or_default(),
        }
    }
}

/// The wizard's collaborators, injected so tests can substitute fakes.
pub struct Collaborators {
    pub scanner: Box<dyn Scanner>,
    pub authenticator: Box<dyn Authenticator>,
    pub authorizer: Box<dyn Authorizer>,
    pub monitor: Box<dyn Monitor>,
    pub policy_store: Box<dyn PolicyStore>,
    pub runner: Arc<dyn ProcessRunner>,
    pub prompter: Box<dyn Prompter>,
    /// Overrides the inspector chosen for the package manager.
    pub inspector: Option<Box<dyn ModuleInspector>>,
}

/// The scan headline goes to stdout, or to stderr in JSON mode so stdout
/// carries only the answers document.
fn write_headline(
    headline: &str,
    json: bool,
    out: &mut impl Write,
    err: &mut impl Write,
) -> std::io::Result<()> {
    if json {
        writeln!(err, "{}", headline)
    } else {
        writeln!(out, "{}", headline)
    }
}

pub async fn run_wizard(
    options: &WizardOptions,
    c: &mut Collaborators,
) -> Result<WizardOutcome, WizardError> {
    let cwd = options.cwd.as_path();

    let manager = detect_package_manager(cwd, options.package_manager.as_deref(), options.file.as_deref())?;
    if !cwd.join("node_modules").is_dir() {
        return Err(WizardError::MissingDependencies(manager.name().to_string()));
    }
    let target_file = detect_target_file(cwd, options.file.as_deref())?;

    debug!("{}", if options.dry_run { "*** dry run ****" } else { "~~~~ LIVE RUN ~~~~" });

    let policy_file = policy_path(cwd, options.policy_path.as_deref(), &options.policy_file);
    let (cli_policy, new_policy) = match c.policy_store.load(&policy_file).await? {
        Some(policy) => (policy, false),
        None => (c.policy_store.create(), true),
    };

    if !c.authenticator.is_authenticated().await? {
        if options.ci {
            return Err(WizardError::MisconfiguredAuthInCi);
        }
        let token = ask_auth_token(c.prompter.as_mut(), &options.tool).await?;
        let accepted = match token {
            Some(token) => c.authenticator.authenticate(&token).await?,
            None => false,
        };
        if !accepted || !c.authenticator.is_authenticated().await? {
            return Err(WizardError::Authentication(format!(
                "Not authenticated; run `{} auth` first",
                options.tool
            )));
        }
        info!("Authenticated with entered token");
    }

    let authorization = c.authorizer.action_allowed(IGNORE_ACTION, options.org.as_deref()).await?;
    let ignore_disabled = if authorization.allowed {
        None
    } else {
        debug!("ignore disabled");
        Some(authorization.reason.unwrap_or_else(|| "Ignoring is not permitted for this organization".into()))
    };

    if options.interactive && !options.ci {
        show_banner();
    }

    let mut ignore_policy = options.ignore_policy;
    if !new_policy && !options.ci && ask_start_over(c.prompter.as_mut()).await? {
        ignore_policy = true;
    }

    let scan = {
        let _scope = ProgressScope::start(
            format!("Testing {} for known vulnerabilities...", cwd.display()),
            options.interactive,
        );
        let scan_options = ScanOptions {
            org: options.org.clone(),
            file: options.file.clone(),
            package_manager: Some(manager.name().to_string()),
            ignore_policy,
        };
        c.scanner.test(cwd, &scan_options).await?
    };
    write_headline(
        &scan.headline(),
        options.json,
        &mut std::io::stdout().lock(),
        &mut std::io::stderr().lock(),
    )?;

    // Questions are filtered by the policy the scan was run against.
    let combined_policy = if scan.policy.trim().is_empty() {
        cli_policy.clone()
    } else {
        c.policy_store.load_from_text(&scan.policy)?
    };
    let manifest = ProjectManifest::read(&cwd.join(MANIFEST_FILE)).await?;

    let prompt_options = PromptOptions {
        tool: options.tool.clone(),
        ignore_expiry_days: options.ignore_expiry_days,
        ignore_disabled,
        ignore_policy,
    };
    let ctx = PipelineContext {
        findings: &scan.vulnerabilities,
        policy: &combined_policy,
        manifest: &manifest,
        scan_ok: scan.ok,
        options: &prompt_options,
        cwd,
        now: Utc::now(),
    };
    let mut answers = run_pipeline(c.prompter.as_mut(), &ctx).await?;
    answers.misc.skip_monitor = options.skip_monitor;

    let analytics = answer_analytics(&answers);
    if options.json {
        return Ok(WizardOutcome::Answers {
            json: json!({
                "answers": analytics,
                "misc": {
                    "addTest": answers.misc.add_test,
                    "addProtect": answers.misc.add_protect,
                    "buildShrinkwrap": answers.misc.build_shrinkwrap,
                },
            }),
        });
    }
    debug!(answers = analytics.len(), "Answers collected");

    let misc = answers.misc;
    let tasks = answers_to_tasks(answers);
    let live = !options.dry_run;
    let synthesis = synthesize(cli_policy, &tasks, live, manager, Utc::now());

    if !live {
        return Ok(WizardOutcome::DryRun {
            summary: dry_run_summary(&synthesis.policy),
        });
    }

    let default_inspector;
    let inspector: &dyn ModuleInspector = match &c.inspector {
        Some(inspector) => inspector.as_ref(),
        None => {
            default_inspector = load_inspector(manager);
            default_inspector.as_ref()
        }
    };
    let effects = SideEffects {
        cwd,
        manager,
        target_file: &target_file,
        policy_path: &policy_file,
        tool: &options.tool,
        tool_version: &options.tool_version,
        org: options.org.as_deref(),
        skip_git: options.ci || options.tap,
        show_progress: options.interactive,
        runner: c.runner.as_ref(),
        store: c.policy_store.as_ref(),
        monitor: c.monitor.as_ref(),
        inspector,
    };
    let report = effects.apply(synthesis, &tasks, &misc).await?;
    info!(tasks = tasks.len(), "Wizard applied");

    let display_name = policy_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| options.policy_file.clone());
    Ok(WizardOutcome::Applied {
        summary: applied_summary(
            new_policy,
            &display_name,
            &options.tool,
            &options.app_url,
            report.monitor.as_ref(),
        ),
    })
}
