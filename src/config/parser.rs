use std::path::Path;
use crate::errors::WizardError;
use super::types::WizardConfig;
use super::schema::CONFIG_SCHEMA;
use tracing::warn;

pub const CONFIG_FILE_NAME: &str = ".protect-wizard.yml";

pub async fn parse_config(path: &Path) -> Result<WizardConfig, WizardError> {
    if !path.exists() {
        return Err(WizardError::Config(format!("Config file not found: {}", path.display())));
    }

    let metadata = tokio::fs::metadata(path).await?;
    if metadata.len() > 1_048_576 {
        return Err(WizardError::Config("Config file exceeds 1MB limit".into()));
    }

    let content = tokio::fs::read_to_string(path).await?;
    let yaml: serde_yaml::Value = serde_yaml::from_str(&content)?;
    if yaml.is_null() {
        return Ok(WizardConfig::default());
    }

    // JSON Schema validation
    validate_schema(&yaml)?;

    let config: WizardConfig = serde_yaml::from_value(yaml)?;

    validate_conflicts(&config)?;

    Ok(config)
}

/// Load the explicit config file if given, else the project's
/// `.protect-wizard.yml` when present, else defaults.
pub async fn load_project_config(
    cwd: &Path,
    explicit: Option<&Path>,
) -> Result<WizardConfig, WizardError> {
    let config = match explicit {
        Some(path) => parse_config(path).await?,
        None => {
            let candidate = cwd.join(CONFIG_FILE_NAME);
            if candidate.exists() {
                parse_config(&candidate).await?
            } else {
                WizardConfig::default()
            }
        }
    };
    Ok(config.with_env())
}

/// Validate config against the JSON schema for structural correctness.
fn validate_schema(yaml: &serde_yaml::Value) -> Result<(), WizardError> {
    let json_value: serde_json::Value = serde_json::to_value(yaml)
        .map_err(|e| WizardError::Config(format!("Config conversion error: {}", e)))?;

    let compiled = jsonschema::JSONSchema::compile(&CONFIG_SCHEMA)
        .map_err(|e| WizardError::Config(format!("Schema compilation error: {}", e)))?;

    let result = compiled.validate(&json_value);
    if let Err(errors) = result {
        // Advisory only
        for e in errors {
            warn!(validation_error = %format!("{} at {}", e, e.instance_path), "Config schema warning");
        }
    }

    Ok(())
}

/// Detect semantic conflicts in the parsed configuration.
fn validate_conflicts(config: &WizardConfig) -> Result<(), WizardError> {
    if config.ignore_expiry_days == Some(0) {
        return Err(WizardError::Config(
            "ignore_expiry_days must be at least 1".into(),
        ));
    }

    if let Some(tool) = &config.tool {
        if tool.trim().is_empty() || tool.contains(char::is_whitespace) {
            return Err(WizardError::Config(format!(
                "Invalid tool name '{}': must be a single package name",
                tool
            )));
        }
    }

    for (name, url) in [("api", &config.api), ("app_url", &config.app_url)] {
        if let Some(url) = url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(WizardError::Config(format!(
                    "{} must be an http(s) URL, got '{}'",
                    name, url
                )));
            }
        }
    }

    if config.token.as_ref().map_or(false, |t| t.trim().is_empty()) {
        warn!("Config token is present but empty");
    }

    Ok(())
}
