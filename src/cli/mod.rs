pub mod commands;
pub mod wizard;
pub mod policy;

pub use commands::{Cli, Commands};

use std::path::PathBuf;

use crate::errors::WizardError;

/// Resolve `--cwd` (or the process directory) once; nothing downstream
/// looks at the process directory again.
pub fn resolve_cwd(explicit: Option<&str>) -> Result<PathBuf, WizardError> {
    let dir = match explicit {
        Some(dir) => PathBuf::from(dir),
        None => std::env::current_dir()?,
    };
    dir.canonicalize()
        .map_err(|e| WizardError::Config(format!("Invalid project directory {}: {}", dir.display(), e)))
}
