use std::sync::LazyLock;

use regex::Regex;

use super::document::{DependencySection, ProjectManifest};

static RELEASE_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\.").expect("valid release pattern"));

pub const DEFAULT_WRITE_LABEL: &str = "Updating package.json...";

/// How the tool package gets installed after the manifest is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallRoute {
    Production,
    Development,
}

#[derive(Debug, Clone)]
pub struct DependencyChange {
    pub manifest: ProjectManifest,
    pub route: InstallRoute,
    pub label: String,
}

/// Semver range for the running tool: `^<version>` for a release build,
/// `*` for anything else (local builds report a branch or commit).
pub fn tool_version_range(version: &str) -> String {
    let version = version.trim();
    if RELEASE_VERSION.is_match(version) {
        format!("^{}", version)
    } else {
        "*".to_string()
    }
}

/// Decide where the tool belongs in the manifest's dependency maps.
///
/// An existing entry in dependencies, peer or optional dependencies is left
/// alone, whatever version it pins.
pub fn classify_tool_dependency(
    manifest: ProjectManifest,
    add_test: bool,
    add_protect: bool,
    tool: &str,
    version_range: &str,
) -> DependencyChange {
    let mut change = DependencyChange {
        manifest,
        route: InstallRoute::Production,
        label: DEFAULT_WRITE_LABEL.to_string(),
    };
    if !(add_test || add_protect) {
        return change;
    }

    let already_present = [
        DependencySection::Dependencies,
        DependencySection::PeerDependencies,
        DependencySection::OptionalDependencies,
    ]
    .iter()
    .any(|section| change.manifest.dependency(*section, tool).is_some());
    if already_present {
        return change;
    }

    let in_dev = change
        .manifest
        .dependency(DependencySection::DevDependencies, tool)
        .is_some();

    if add_protect {
        change.manifest = change
            .manifest
            .with_dependency(DependencySection::Dependencies, tool, version_range)
            .without_dependency(DependencySection::DevDependencies, tool);
        change.label = format!(
            "Adding {} to production dependencies (used by {} protect)",
            tool, tool
        );
    } else if !in_dev {
        change.manifest = change.manifest.with_dependency(
            DependencySection::DevDependencies,
            tool,
            version_range,
        );
        change.route = InstallRoute::Development;
        change.label = format!("Adding {} to devDependencies (used by npm test)", tool);
    }
    change
}
