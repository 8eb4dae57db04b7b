use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::WizardError;
use super::{
    Authenticator, Authorization, Authorizer, DepTreeSnapshot, Monitor, MonitorMeta, MonitorResult,
};

/// HTTP client for the account service. Clones share the token, so one
/// entered at the prompt is seen by every role the client plays.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Arc<RwLock<Option<String>>>,
}

impl ApiClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: Arc::new(RwLock::new(token.map(str::to_string))),
        }
    }

    fn token(&self) -> Option<String> {
        self.token.read().ok().and_then(|t| t.clone())
    }

    fn auth_header(&self) -> Result<String, WizardError> {
        self.token()
            .map(|t| format!("token {}", t))
            .ok_or_else(|| WizardError::Authentication("No API token configured; run `snyk auth`".into()))
    }
}

#[async_trait]
impl Authenticator for ApiClient {
    async fn is_authenticated(&self) -> Result<bool, WizardError> {
        Ok(self.token().map_or(false, |t| !t.trim().is_empty()))
    }

    async fn authenticate(&self, token: &str) -> Result<bool, WizardError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(false);
        }
        let mut slot = self
            .token
            .write()
            .map_err(|_| WizardError::Internal("API token lock poisoned".into()))?;
        *slot = Some(token.to_string());
        debug!("API token set for this run");
        Ok(true)
    }
}

#[async_trait]
impl Authorizer for ApiClient {
    async fn action_allowed(&self, action: &str, org: Option<&str>) -> Result<Authorization, WizardError> {
        let Ok(auth) = self.auth_header() else {
            return Ok(Authorization::allowed());
        };
        let mut request = self
            .client
            .get(format!("{}/authorization/{}", self.base_url, action))
            .header("Authorization", auth);
        if let Some(org) = org {
            request = request.query(&[("org", org)]);
        }

        // The service being unreachable must not block the wizard.
        let resp = match request.send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(action, error = %e, "Authorization check failed, assuming allowed");
                return Ok(Authorization::allowed());
            }
        };
        if !resp.status().is_success() {
            debug!(action, status = %resp.status(), "Authorization check not conclusive");
            return Ok(Authorization::allowed());
        }

        let data: Value = resp.json().await
            .map_err(|e| WizardError::Network(format!("Failed to parse authorization response: {}", e)))?;
        let result = data.get("result").cloned().unwrap_or(data);
        Ok(serde_json::from_value(result).unwrap_or_else(|_| Authorization::allowed()))
    }
}

#[async_trait]
impl Monitor for ApiClient {
    async fn register(
        &self,
        _cwd: &Path,
        meta: &MonitorMeta,
        snapshot: &DepTreeSnapshot,
    ) -> Result<MonitorResult, WizardError> {
        let body = json!({
            "meta": meta,
            "package": snapshot,
        });
        let mut request = self
            .client
            .put(format!("{}/monitor/{}", self.base_url, meta.package_manager))
            .header("Authorization", self.auth_header()?)
            .json(&body);
        if let Some(org) = &meta.org {
            request = request.query(&[("org", org)]);
        }

        let resp = request.send().await
            .map_err(|e| WizardError::Network(format!("Monitor request failed: {}", e)))?;

        let status = resp.status();
        if status == 401 {
            return Err(WizardError::Authentication("Invalid API token".into()));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(WizardError::Monitor(format!("Monitor returned {}: {}", status, text)));
        }

        let result: MonitorResult = resp.json().await
            .map_err(|e| WizardError::Monitor(format!("Failed to parse monitor response: {}", e)))?;
        debug!(id = %result.id, monitored = result.is_monitored, "Snapshot registered");
        Ok(result)
    }
}
