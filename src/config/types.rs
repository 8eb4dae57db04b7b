use serde::{Deserialize, Serialize};

pub const DEFAULT_API: &str = "https://snyk.io/api/v1";
pub const DEFAULT_TOOL: &str = "snyk";
pub const DEFAULT_POLICY_FILE: &str = ".snyk";
pub const DEFAULT_IGNORE_EXPIRY_DAYS: u32 = 30;

/// Project-level configuration, read from `.protect-wizard.yml`.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct WizardConfig {
    pub org: Option<String>,
    pub api: Option<String>,
    pub app_url: Option<String>,
    pub token: Option<String>,
    /// Name of the remediation tool package injected into the manifest.
    pub tool: Option<String>,
    pub policy_file: Option<String>,
    pub ignore_expiry_days: Option<u32>,
    /// Force continuous-integration behaviour regardless of environment.
    pub ci: Option<bool>,
}

impl WizardConfig {
    pub fn api(&self) -> &str {
        self.api.as_deref().unwrap_or(DEFAULT_API)
    }

    /// Base for links into the web app; defaults to the origin of `api`.
    pub fn app_url(&self) -> String {
        if let Some(url) = &self.app_url {
            return url.trim_end_matches('/').to_string();
        }
        match reqwest::Url::parse(self.api()) {
            Ok(url) => url.origin().ascii_serialization(),
            Err(_) => self.api().to_string(),
        }
    }

    pub fn tool(&self) -> &str {
        self.tool.as_deref().unwrap_or(DEFAULT_TOOL)
    }

    pub fn policy_file(&self) -> &str {
        self.policy_file.as_deref().unwrap_or(DEFAULT_POLICY_FILE)
    }

    pub fn ignore_expiry_days(&self) -> u32 {
        self.ignore_expiry_days.unwrap_or(DEFAULT_IGNORE_EXPIRY_DAYS)
    }

    /// Fill unset values from the environment (`SNYK_TOKEN`, `SNYK_API`).
    pub fn with_env(mut self) -> Self {
        if self.token.is_none() {
            self.token = std::env::var("SNYK_TOKEN").ok().filter(|t| !t.trim().is_empty());
        }
        if self.api.is_none() {
            self.api = std::env::var("SNYK_API").ok().filter(|a| !a.trim().is_empty());
        }
        self
    }
}

/// Whether the process runs inside a continuous-integration environment.
pub fn is_ci() -> bool {
    ["CI", "CONTINUOUS_INTEGRATION", "BUILD_NUMBER", "RUN_ID"]
        .iter()
        .any(|var| std::env::var(var).map_or(false, |v| !v.is_empty() && v != "false"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WizardConfig::default();
        assert_eq!(config.api(), DEFAULT_API);
        assert_eq!(config.app_url(), "https://snyk.io");
        assert_eq!(config.tool(), "snyk");
        assert_eq!(config.policy_file(), ".snyk");
        assert_eq!(config.ignore_expiry_days(), 30);
    }

    #[test]
    fn test_explicit_values_win() {
        let config = WizardConfig {
            tool: Some("guard".into()),
            ignore_expiry_days: Some(7),
            ..Default::default()
        };
        assert_eq!(config.tool(), "guard");
        assert_eq!(config.ignore_expiry_days(), 7);
    }

    #[test]
    fn test_deserialize_yaml() {
        let config: WizardConfig = serde_yaml::from_str("org: acme\nci: true\n").unwrap();
        assert_eq!(config.org.as_deref(), Some("acme"));
        assert_eq!(config.ci, Some(true));
        assert!(config.token.is_none());
    }
}
