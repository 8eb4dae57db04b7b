use std::path::Path;

use tracing::debug;

use crate::errors::WizardError;
use super::PackageManagerKind;

/// Target files in detection priority order, with the ecosystem each implies.
const TARGET_FILES: &[(&str, &str)] = &[
    ("yarn.lock", "yarn"),
    ("package-lock.json", "npm"),
    ("package.json", "npm"),
    ("Gemfile.lock", "rubygems"),
    ("Gemfile", "rubygems"),
    ("pom.xml", "maven"),
    ("build.gradle", "gradle"),
    ("build.sbt", "sbt"),
    ("requirements.txt", "pip"),
    ("Gopkg.lock", "golangdep"),
    ("go.mod", "gomodules"),
    ("vendor/vendor.json", "govendor"),
    ("packages.config", "nuget"),
    ("paket.dependencies", "paket"),
    ("composer.lock", "composer"),
];

const LOCKFILES: &[&str] = &["package-lock.json", "yarn.lock"];

fn ecosystem_for_file(file: &str) -> Option<&'static str> {
    let name = Path::new(file)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file);
    if name.ends_with(".csproj") || name == "project.json" {
        return Some("nuget");
    }
    TARGET_FILES
        .iter()
        .find(|(target, _)| file.ends_with(target) || *target == name)
        .map(|(_, eco)| *eco)
}

/// First known target file present in `cwd`, or the explicit `--file`.
pub fn detect_target_file(cwd: &Path, file: Option<&str>) -> Result<String, WizardError> {
    if let Some(file) = file {
        if !cwd.join(file).exists() {
            return Err(WizardError::MissingTargetFile(file.to_string()));
        }
        return Ok(file.to_string());
    }
    TARGET_FILES
        .iter()
        .map(|(target, _)| *target)
        .find(|target| cwd.join(target).is_file())
        .map(str::to_string)
        .ok_or_else(|| WizardError::MissingTargetFile(cwd.display().to_string()))
}

/// Explicit name wins, then the ecosystem implied by the target file.
pub fn detect_package_manager(
    cwd: &Path,
    explicit: Option<&str>,
    file: Option<&str>,
) -> Result<PackageManagerKind, WizardError> {
    if let Some(name) = explicit {
        return PackageManagerKind::parse(name);
    }
    let target = detect_target_file(cwd, file)?;
    let ecosystem = ecosystem_for_file(&target).unwrap_or("npm");
    debug!(target = %target, ecosystem, "Detected package manager");
    PackageManagerKind::parse(ecosystem)
}

pub fn is_lockfile_based(target_file: &str) -> bool {
    LOCKFILES.iter().any(|lock| target_file.ends_with(lock))
}
