use std::path::Path;

use crate::config::load_project_config;
use crate::errors::WizardError;
use crate::policy::{display, policy_path, FilePolicyStore, PolicyStore};
use super::commands::PolicyArgs;
use super::resolve_cwd;

pub async fn handle_policy(args: PolicyArgs) -> Result<(), WizardError> {
    let cwd = resolve_cwd(args.cwd.as_deref())?;
    let config = load_project_config(&cwd, args.config.as_deref().map(Path::new)).await?;
    let path = policy_path(&cwd, args.policy_path.as_deref().map(Path::new), config.policy_file());

    let policy = FilePolicyStore
        .load(&path)
        .await?
        .ok_or_else(|| WizardError::Policy(format!("Could not load policy from {}", path.display())))?;
    println!("{}", display(&policy));
    Ok(())
}
