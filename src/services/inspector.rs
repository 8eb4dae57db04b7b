use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::WizardError;
use crate::manifest::{DependencySection, ProjectManifest, MANIFEST_FILE};
use crate::package_manager::PackageManagerKind;
use super::{DepTreeSnapshot, ModuleInspector};

/// Inspector plugin for the detected package manager.
pub fn load_inspector(manager: PackageManagerKind) -> Box<dyn ModuleInspector> {
    match manager {
        PackageManagerKind::Npm => Box::new(NpmInspector),
        PackageManagerKind::Yarn => Box::new(YarnInspector),
    }
}

async fn read_manifest(cwd: &Path, target_file: &str) -> Result<ProjectManifest, WizardError> {
    let dir = cwd.join(target_file);
    let dir = dir.parent().unwrap_or(cwd);
    ProjectManifest::read(&dir.join(MANIFEST_FILE)).await
}

fn declared(manifest: &ProjectManifest) -> BTreeMap<String, String> {
    let mut deps = BTreeMap::new();
    for section in [DependencySection::Dependencies, DependencySection::DevDependencies] {
        if let Some(map) = manifest.section(section) {
            for (name, range) in map {
                if let Some(range) = range.as_str() {
                    deps.entry(name.clone()).or_insert_with(|| range.to_string());
                }
            }
        }
    }
    deps
}

fn snapshot(manifest: &ProjectManifest, manager: PackageManagerKind, target_file: &str) -> DepTreeSnapshot {
    DepTreeSnapshot {
        name: manifest.name().unwrap_or("unnamed").to_string(),
        version: manifest.version().unwrap_or("0.0.0").to_string(),
        package_manager: manager.name().to_string(),
        target_file: target_file.to_string(),
        dependencies: BTreeMap::new(),
    }
}

const NODE_MODULES: &str = "node_modules/";

/// Resolved versions from `package-lock.json`, lockfile v1 or v2+.
fn lockfile_versions(lock: &Value) -> BTreeMap<String, String> {
    let mut versions = BTreeMap::new();
    if let Some(packages) = lock.get("packages").and_then(Value::as_object) {
        for (key, entry) in packages {
            let Some(idx) = key.rfind(NODE_MODULES) else {
                continue;
            };
            let name = &key[idx + NODE_MODULES.len()..];
            if let Some(version) = entry.get("version").and_then(Value::as_str) {
                versions.entry(name.to_string()).or_insert_with(|| version.to_string());
            }
        }
    } else if let Some(deps) = lock.get("dependencies").and_then(Value::as_object) {
        for (name, entry) in deps {
            if let Some(version) = entry.get("version").and_then(Value::as_str) {
                versions.insert(name.clone(), version.to_string());
            }
        }
    }
    versions
}

pub struct NpmInspector;

#[async_trait]
impl ModuleInspector for NpmInspector {
    async fn inspect(&self, cwd: &Path, target_file: &str) -> Result<DepTreeSnapshot, WizardError> {
        let manifest = read_manifest(cwd, target_file).await?;
        let mut snap = snapshot(&manifest, PackageManagerKind::Npm, target_file);
        let declared = declared(&manifest);

        let lock_path = cwd.join("package-lock.json");
        let resolved = match tokio::fs::read_to_string(&lock_path).await {
            Ok(text) => lockfile_versions(&serde_json::from_str(&text)?),
            Err(_) => BTreeMap::new(),
        };

        for (name, range) in declared {
            let version = match resolved.get(&name) {
                Some(v) => v.clone(),
                None => installed_version(cwd, &name).await.unwrap_or(range),
            };
            snap.dependencies.insert(name, version);
        }
        debug!(deps = snap.dependencies.len(), "npm project inspected");
        Ok(snap)
    }
}

async fn installed_version(cwd: &Path, name: &str) -> Option<String> {
    let path = cwd.join("node_modules").join(name).join(MANIFEST_FILE);
    let text = tokio::fs::read_to_string(path).await.ok()?;
    let value: Value = serde_json::from_str(&text).ok()?;
    value.get("version").and_then(Value::as_str).map(str::to_string)
}

/// `name@range` → version from a classic `yarn.lock`.
pub fn parse_yarn_lock(text: &str) -> BTreeMap<String, String> {
    let mut versions = BTreeMap::new();
    let mut current: Vec<String> = Vec::new();
    for line in text.lines() {
        if line.starts_with('#') || line.trim().is_empty() {
            continue;
        }
        if !line.starts_with(' ') && line.ends_with(':') {
            current = line
                .trim_end_matches(':')
                .split(", ")
                .map(|spec| spec.trim_matches('"').to_string())
                .collect();
        } else if let Some(rest) = line.trim().strip_prefix("version ") {
            let version = rest.trim_matches('"').to_string();
            for spec in current.drain(..) {
                versions.insert(spec, version.clone());
            }
        }
    }
    versions
}

pub struct YarnInspector;

#[async_trait]
impl ModuleInspector for YarnInspector {
    async fn inspect(&self, cwd: &Path, target_file: &str) -> Result<DepTreeSnapshot, WizardError> {
        let manifest = read_manifest(cwd, target_file).await?;
        let mut snap = snapshot(&manifest, PackageManagerKind::Yarn, target_file);

        let lock = tokio::fs::read_to_string(cwd.join("yarn.lock")).await.unwrap_or_default();
        let resolved = parse_yarn_lock(&lock);

        for (name, range) in declared(&manifest) {
            let key = format!("{}@{}", name, range);
            let version = resolved.get(&key).cloned().unwrap_or(range);
            snap.dependencies.insert(name, version);
        }
        debug!(deps = snap.dependencies.len(), "yarn project inspected");
        Ok(snap)
    }
}
