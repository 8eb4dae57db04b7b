use std::path::Path;

use tracing::{debug, info};

use crate::errors::WizardError;
use crate::git::try_stage_file;
use crate::manifest::{apply_next_steps, InstallRoute, ProjectManifest, MANIFEST_FILE};
use crate::models::MiscFlags;
use crate::package_manager::{self, is_lockfile_based, PackageManagerKind};
use crate::policy::{PolicyStore, Synthesis};
use crate::progress::ProgressScope;
use crate::process::ProcessRunner;
use crate::remediation::RemediationTasks;
use crate::services::{ModuleInspector, Monitor, MonitorMeta, MonitorResult};

/// Everything the live steps touch. Built by the orchestrator once the
/// run is known to be live.
pub struct SideEffects<'a> {
    pub cwd: &'a Path,
    pub manager: PackageManagerKind,
    pub target_file: &'a str,
    pub policy_path: &'a Path,
    pub tool: &'a str,
    pub tool_version: &'a str,
    pub org: Option<&'a str>,
    /// Skip git staging (CI, or running under a TAP harness).
    pub skip_git: bool,
    pub show_progress: bool,
    pub runner: &'a dyn ProcessRunner,
    pub store: &'a dyn PolicyStore,
    pub monitor: &'a dyn Monitor,
    pub inspector: &'a dyn ModuleInspector,
}

#[derive(Debug, Clone, Default)]
pub struct SideEffectReport {
    pub manifest_written: bool,
    pub lockfile_refreshed: bool,
    pub shrinkwrap_built: bool,
    pub monitor: Option<MonitorResult>,
}

impl SideEffects<'_> {
    fn scope(&self, label: impl Into<String>) -> ProgressScope {
        ProgressScope::start(label, self.show_progress)
    }

    /// Apply a synthesized result to disk and the outside world, in order.
    /// A failure stops the sequence; earlier steps stay applied.
    pub async fn apply(
        &self,
        synthesis: Synthesis,
        tasks: &RemediationTasks,
        misc: &MiscFlags,
    ) -> Result<SideEffectReport, WizardError> {
        let mut report = SideEffectReport::default();
        let Synthesis { mut policy, install } = synthesis;

        if !install.is_empty() {
            let _scope = self.scope("Applying updates...");
            package_manager::install(self.runner, install.manager, &install.packages, install.live, self.cwd)
                .await?;
        }

        {
            let _scope = self.scope("Saving policy file...");
            self.store.save(&mut policy, self.policy_path).await?;
        }

        if self.skip_git {
            debug!("Skipping git staging");
        } else {
            try_stage_file(self.policy_path);
        }

        // Installs above may have rewritten the manifest.
        let manifest_path = self.cwd.join(MANIFEST_FILE);
        let manifest = ProjectManifest::read(&manifest_path).await?;

        let manager_version = if misc.add_protect && self.manager == PackageManagerKind::Npm {
            package_manager::manager_version(self.runner, self.manager, self.cwd).await?
        } else {
            String::new()
        };
        let (change, opted_in) = apply_next_steps(
            manifest,
            misc,
            self.manager,
            &manager_version,
            self.tool,
            self.tool_version,
        );

        if opted_in || !tasks.update.is_empty() {
            let _scope = self.scope(change.label.clone());
            change.manifest.write(&manifest_path).await?;
            report.manifest_written = true;

            if is_lockfile_based(self.target_file) {
                let packages = vec![self.tool.to_string()];
                match change.route {
                    InstallRoute::Production => {
                        package_manager::install(self.runner, self.manager, &packages, true, self.cwd).await?
                    }
                    InstallRoute::Development => {
                        package_manager::install_dev(self.runner, self.manager, &packages, true, self.cwd).await?
                    }
                }
                report.lockfile_refreshed = true;
            }
        }

        if misc.build_shrinkwrap && !tasks.update.is_empty() {
            debug!("updating shrinkwrap");
            let _scope = self.scope("Updating npm-shrinkwrap.json...");
            package_manager::shrinkwrap(self.runner, true, self.cwd).await?;
            report.shrinkwrap_built = true;
        }

        if misc.skip_monitor {
            debug!("Monitoring skipped");
        } else {
            debug!("running monitor");
            let _scope = self.scope("Remembering current dependencies for future notifications...");
            let snapshot = self.inspector.inspect(self.cwd, self.target_file).await?;
            let meta = MonitorMeta {
                method: "wizard".to_string(),
                package_manager: self.manager.name().to_string(),
                org: self.org.map(str::to_string),
            };
            report.monitor = Some(self.monitor.register(self.cwd, &meta, &snapshot).await?);
        }

        info!(
            manifest_written = report.manifest_written,
            lockfile_refreshed = report.lockfile_refreshed,
            monitored = report.monitor.is_some(),
            "Side effects applied"
        );
        Ok(report)
    }
}
