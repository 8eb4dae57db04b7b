use std::path::Path;

use tracing::{debug, error};

use crate::errors::WizardError;
use crate::process::{ExecOutput, ProcessRunner};
use super::PackageManagerKind;

/// Arguments for `<pm> <method> [flags] [packages]`. With packages but no
/// flags npm gets `--save`; a bare `shrinkwrap` must stay bare.
pub fn build_args(
    manager: PackageManagerKind,
    method: &str,
    packages: &[String],
    flags: &[String],
) -> Vec<String> {
    let mut args = vec![method.to_string()];
    args.extend(flags.iter().cloned());
    if manager == PackageManagerKind::Npm && !packages.is_empty() && flags.is_empty() {
        args.push("--save".to_string());
    }
    args.extend(packages.iter().cloned());
    args
}

async fn run_manager(
    runner: &dyn ProcessRunner,
    manager: PackageManagerKind,
    method: &str,
    packages: &[String],
    flags: &[String],
    live: bool,
    cwd: &Path,
) -> Result<(), WizardError> {
    let args = build_args(manager, method, packages, flags);
    let command_line = ExecOutput::describe(manager.command(), &args);
    debug!("{}$ {}", cwd.display(), command_line);

    if !live {
        debug!("[skipping - dry run]");
        return Ok(());
    }

    let output = runner.run(manager.command(), &args, cwd).await?;
    if !output.success() {
        return Err(WizardError::UpdateFailed(format!(
            "`{}` exited with status {}: {}",
            command_line,
            output.status,
            output.stderr.trim()
        )));
    }
    if output.stderr.contains("ERR!") {
        error!("{}", output.stderr.trim());
        return Err(WizardError::UpdateFailed(format!(
            "{} update issues: {}",
            manager,
            output.stderr.trim()
        )));
    }
    debug!("{} {} complete", manager, method);
    Ok(())
}

fn add_method(manager: PackageManagerKind) -> &'static str {
    match manager {
        PackageManagerKind::Npm => "install",
        PackageManagerKind::Yarn => "add",
    }
}

pub async fn install(
    runner: &dyn ProcessRunner,
    manager: PackageManagerKind,
    packages: &[String],
    live: bool,
    cwd: &Path,
) -> Result<(), WizardError> {
    run_manager(runner, manager, add_method(manager), packages, &[], live, cwd).await
}

pub async fn install_dev(
    runner: &dyn ProcessRunner,
    manager: PackageManagerKind,
    packages: &[String],
    live: bool,
    cwd: &Path,
) -> Result<(), WizardError> {
    let flag = match manager {
        PackageManagerKind::Npm => "--save-dev",
        PackageManagerKind::Yarn => "--dev",
    };
    run_manager(runner, manager, add_method(manager), packages, &[flag.to_string()], live, cwd).await
}

/// `npm shrinkwrap`; the shrinkwrap file is npm-only.
pub async fn shrinkwrap(runner: &dyn ProcessRunner, live: bool, cwd: &Path) -> Result<(), WizardError> {
    run_manager(runner, PackageManagerKind::Npm, "shrinkwrap", &[], &[], live, cwd).await
}

/// `<pm> --version`, trimmed.
pub async fn manager_version(
    runner: &dyn ProcessRunner,
    manager: PackageManagerKind,
    cwd: &Path,
) -> Result<String, WizardError> {
    let output = runner
        .run(manager.command(), &["--version".to_string()], cwd)
        .await?;
    if !output.success() {
        return Err(WizardError::Process(format!(
            "{} --version exited with status {}",
            manager, output.status
        )));
    }
    Ok(output.stdout.trim().to_string())
}
