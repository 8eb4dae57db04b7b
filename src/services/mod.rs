//! Collaborators the wizard talks to: the vulnerability scanner, the account
//! service (authentication, authorization, monitoring) and the dependency
//! tree inspectors.

pub mod api;
pub mod scanner;
pub mod inspector;

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::WizardError;
use crate::models::ScanResult;

pub use api::ApiClient;
pub use inspector::{load_inspector, NpmInspector, YarnInspector};
pub use scanner::CommandScanner;

/// Action name checked before offering the ignore choice.
pub const IGNORE_ACTION: &str = "cliIgnore";

#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    pub org: Option<String>,
    pub file: Option<String>,
    pub package_manager: Option<String>,
    pub ignore_policy: bool,
}

#[async_trait]
pub trait Scanner: Send + Sync {
    async fn test(&self, cwd: &Path, options: &ScanOptions) -> Result<ScanResult, WizardError>;
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn is_authenticated(&self) -> Result<bool, WizardError>;

    /// Use `token` for the rest of the run; `Ok(false)` when it is unusable.
    async fn authenticate(&self, token: &str) -> Result<bool, WizardError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Authorization {
    pub allowed: bool,
    #[serde(default)]
    pub reason: Option<String>,
}

impl Authorization {
    pub fn allowed() -> Self {
        Self { allowed: true, reason: None }
    }
}

#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn action_allowed(&self, action: &str, org: Option<&str>) -> Result<Authorization, WizardError>;
}

/// Flattened dependency tree of one project, as sent for monitoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepTreeSnapshot {
    pub name: String,
    pub version: String,
    pub package_manager: String,
    pub target_file: String,
    /// Package name → resolved version.
    pub dependencies: BTreeMap<String, String>,
}

#[async_trait]
pub trait ModuleInspector: Send + Sync {
    async fn inspect(&self, cwd: &Path, target_file: &str) -> Result<DepTreeSnapshot, WizardError>;
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorMeta {
    pub method: String,
    pub package_manager: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorResult {
    pub id: String,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub is_monitored: bool,
    #[serde(default)]
    pub trial_started: bool,
}

#[async_trait]
pub trait Monitor: Send + Sync {
    async fn register(
        &self,
        cwd: &Path,
        meta: &MonitorMeta,
        snapshot: &DepTreeSnapshot,
    ) -> Result<MonitorResult, WizardError>;
}
