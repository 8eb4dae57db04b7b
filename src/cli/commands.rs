use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "protect-wizard",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_TIMESTAMP"), ")"),
    about = "Interactive vulnerability remediation for npm and yarn projects"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Walk through the project's vulnerabilities and remediate them
    Wizard(WizardArgs),
    /// Display the project's policy file
    Policy(PolicyArgs),
    /// Validate a configuration file
    Validate(ValidateArgs),
}

#[derive(Args, Clone, Default)]
pub struct WizardArgs {
    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub cwd: Option<String>,

    /// Compute and show the resulting policy without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Organization to test and monitor under
    #[arg(long)]
    pub org: Option<String>,

    /// Target file (package.json, package-lock.json or yarn.lock)
    #[arg(long)]
    pub file: Option<String>,

    /// Package manager: npm or yarn
    #[arg(long)]
    pub package_manager: Option<String>,

    /// Policy file or directory containing it
    #[arg(long)]
    pub policy_path: Option<String>,

    /// Ask about findings already covered by the policy
    #[arg(long)]
    pub ignore_policy: bool,

    /// JSON file of scripted answers (non-interactive)
    #[arg(long)]
    pub answers: Option<String>,

    /// Read the scan result from a JSON file instead of running the scanner
    #[arg(long)]
    pub scan_result: Option<String>,

    /// Print the collected answers as JSON instead of applying them
    #[arg(long)]
    pub json: bool,

    /// Do not register a dependency snapshot for monitoring
    #[arg(long)]
    pub no_monitor: bool,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct PolicyArgs {
    /// Policy file or directory containing it
    #[arg(long)]
    pub policy_path: Option<String>,

    /// Project directory (defaults to the current directory)
    #[arg(long)]
    pub cwd: Option<String>,

    /// YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(Args, Clone)]
pub struct ValidateArgs {
    /// Configuration file to validate
    pub config: String,
}
