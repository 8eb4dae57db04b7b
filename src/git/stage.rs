use std::path::Path;

use tracing::{debug, info};

use crate::errors::WizardError;

/// Add `file` to the index of the repository containing it.
pub fn stage_file(file: &Path) -> Result<(), WizardError> {
    let file = file
        .canonicalize()
        .map_err(|e| WizardError::Git(format!("Failed to resolve {}: {}", file.display(), e)))?;
    let parent = file
        .parent()
        .ok_or_else(|| WizardError::Git(format!("{} has no parent directory", file.display())))?;

    let repo = git2::Repository::discover(parent)
        .map_err(|e| WizardError::Git(format!("Failed to open repo: {}", e)))?;
    let workdir = repo
        .workdir()
        .ok_or_else(|| WizardError::Git("Repository is bare".to_string()))?
        .canonicalize()
        .map_err(|e| WizardError::Git(format!("Failed to resolve workdir: {}", e)))?;
    let relative = file
        .strip_prefix(&workdir)
        .map_err(|_| WizardError::Git(format!("{} is outside the repository", file.display())))?;

    let mut index = repo.index()
        .map_err(|e| WizardError::Git(format!("Failed to get index: {}", e)))?;
    index.add_path(relative)
        .map_err(|e| WizardError::Git(format!("Failed to add {}: {}", relative.display(), e)))?;
    index.write()
        .map_err(|e| WizardError::Git(format!("Failed to write index: {}", e)))?;

    info!(file = %relative.display(), "Staged in git");
    Ok(())
}

/// Best-effort staging: errors are logged and swallowed.
pub fn try_stage_file(file: &Path) {
    if let Err(e) = stage_file(file) {
        debug!(error = %e, "error adding policy file to git");
    }
}
