use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info};

use crate::errors::WizardError;
use super::record::PolicyRecord;

/// Loads and persists policy records.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// `Ok(None)` when no policy exists at `path`.
    async fn load(&self, path: &Path) -> Result<Option<PolicyRecord>, WizardError>;

    fn create(&self) -> PolicyRecord {
        PolicyRecord::create()
    }

    /// Parse policy text returned alongside a scan.
    fn load_from_text(&self, text: &str) -> Result<PolicyRecord, WizardError> {
        PolicyRecord::parse(text)
    }

    /// Persist `policy`, refreshing its modified timestamp.
    async fn save(&self, policy: &mut PolicyRecord, path: &Path) -> Result<(), WizardError>;
}

#[derive(Debug, Clone, Default)]
pub struct FilePolicyStore;

#[async_trait]
impl PolicyStore for FilePolicyStore {
    async fn load(&self, path: &Path) -> Result<Option<PolicyRecord>, WizardError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No existing policy");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };
        let mut policy = PolicyRecord::parse(&content)?;
        policy.filename = Some(path.to_path_buf());
        Ok(Some(policy))
    }

    async fn save(&self, policy: &mut PolicyRecord, path: &Path) -> Result<(), WizardError> {
        let now = Utc::now();
        policy.created.get_or_insert(now);
        policy.modified = Some(now);
        let text = policy.to_yaml()?;
        tokio::fs::write(path, text).await?;
        policy.filename = Some(path.to_path_buf());
        info!(path = %path.display(), "Policy saved");
        Ok(())
    }
}

/// Resolve the policy file location: an explicit directory or file, else
/// `<cwd>/<policy_file>`.
pub fn policy_path(cwd: &Path, explicit: Option<&Path>, policy_file: &str) -> PathBuf {
    let Some(explicit) = explicit else {
        return cwd.join(policy_file);
    };
    let resolved = cwd.join(explicit);
    if resolved.is_dir() {
        resolved.join(policy_file)
    } else {
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FilePolicyStore;
        assert!(store.load(&dir.path().join(".snyk")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_keeps_created_and_refreshes_modified() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".snyk");
        let store = FilePolicyStore;

        let mut policy = store.create();
        let created = policy.created;
        store.save(&mut policy, &path).await.unwrap();
        let first_modified = policy.modified;
        assert!(first_modified.is_some());

        let mut loaded = store.load(&path).await.unwrap().unwrap();
        assert_eq!(loaded.created, created);
        assert_eq!(loaded.filename.as_deref(), Some(path.as_path()));

        std::thread::sleep(std::time::Duration::from_millis(5));
        store.save(&mut loaded, &path).await.unwrap();
        assert_eq!(loaded.created, created);
        assert!(loaded.modified > first_modified);
    }

    #[test]
    fn test_policy_path_resolution() {
        let dir = TempDir::new().unwrap();
        assert_eq!(policy_path(dir.path(), None, ".snyk"), dir.path().join(".snyk"));
        assert_eq!(
            policy_path(dir.path(), Some(dir.path()), ".snyk"),
            dir.path().join(".snyk")
        );
        assert_eq!(
            policy_path(dir.path(), Some(Path::new("conf/.snyk")), ".snyk"),
            dir.path().join("conf/.snyk")
        );
    }
}
