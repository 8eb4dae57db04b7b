pub mod detect;
pub mod command;

use std::fmt;

use crate::errors::WizardError;

pub use command::{build_args, install, install_dev, manager_version, shrinkwrap};
pub use detect::{detect_package_manager, detect_target_file, is_lockfile_based};

/// Display names of every ecosystem the scanner knows about.
pub const KNOWN_PACKAGE_MANAGERS: &[(&str, &str)] = &[
    ("rubygems", "RubyGems"),
    ("npm", "npm"),
    ("yarn", "Yarn"),
    ("maven", "Maven"),
    ("pip", "pip"),
    ("sbt", "SBT"),
    ("gradle", "Gradle"),
    ("golangdep", "dep (Go)"),
    ("gomodules", "Go Modules"),
    ("govendor", "govendor"),
    ("nuget", "NuGet"),
    ("paket", "Paket"),
    ("composer", "Composer"),
];

pub fn display_name(name: &str) -> &str {
    KNOWN_PACKAGE_MANAGERS
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, display)| *display)
        .unwrap_or(name)
}

/// The package managers the wizard can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManagerKind {
    Npm,
    Yarn,
}

impl PackageManagerKind {
    /// Resolve a package manager name; known but unsupported ecosystems are
    /// reported with their display name.
    pub fn parse(name: &str) -> Result<Self, WizardError> {
        match name.to_lowercase().as_str() {
            "npm" => Ok(Self::Npm),
            "yarn" => Ok(Self::Yarn),
            other => Err(WizardError::UnsupportedPackageManager(
                display_name(other).to_string(),
            )),
        }
    }

    /// Executable name.
    pub fn command(&self) -> &'static str {
        match self {
            Self::Npm => "npm",
            Self::Yarn => "yarn",
        }
    }

    pub fn name(&self) -> &'static str {
        self.command()
    }
}

impl fmt::Display for PackageManagerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
