pub mod document;
pub mod scripts;
pub mod dependencies;

pub use dependencies::{
    classify_tool_dependency, tool_version_range, DependencyChange, InstallRoute,
};
pub use document::{DependencySection, ProjectManifest, Scripts, MANIFEST_FILE};
pub use scripts::{add_protect_scripts, add_test_script};

use crate::models::MiscFlags;
use crate::package_manager::PackageManagerKind;

/// Chain the opted-in script injections and dependency classification over
/// one manifest value. `opted_in` is false when neither flag was set.
pub fn apply_next_steps(
    manifest: ProjectManifest,
    misc: &MiscFlags,
    manager: PackageManagerKind,
    manager_version: &str,
    tool: &str,
    tool_version: &str,
) -> (DependencyChange, bool) {
    let mut manifest = manifest;
    if misc.add_test {
        let scripts = add_test_script(&manifest.scripts(), tool);
        manifest = manifest.with_scripts(scripts);
    }
    if misc.add_protect {
        let scripts = add_protect_scripts(&manifest.scripts(), manager_version, manager, tool);
        manifest = manifest.with_scripts(scripts).with_protection_marker(tool);
    }
    let range = tool_version_range(tool_version);
    let change = classify_tool_dependency(manifest, misc.add_test, misc.add_protect, tool, &range);
    (change, misc.add_test || misc.add_protect)
}
