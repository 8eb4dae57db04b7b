use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::errors::WizardError;
use crate::models::ScanResult;
use crate::process::ProcessRunner;
use super::{ScanOptions, Scanner};

/// Scanner backed by `<tool> test --json`, or by a saved JSON result.
pub struct CommandScanner {
    runner: Arc<dyn ProcessRunner>,
    tool: String,
    saved_result: Option<PathBuf>,
}

impl CommandScanner {
    pub fn new(runner: Arc<dyn ProcessRunner>, tool: &str) -> Self {
        Self {
            runner,
            tool: tool.to_string(),
            saved_result: None,
        }
    }

    pub fn with_saved_result(mut self, path: Option<PathBuf>) -> Self {
        self.saved_result = path;
        self
    }

    fn args(options: &ScanOptions) -> Vec<String> {
        let mut args = vec!["test".to_string(), "--json".to_string()];
        if let Some(org) = &options.org {
            args.push(format!("--org={}", org));
        }
        if let Some(file) = &options.file {
            args.push(format!("--file={}", file));
        }
        if let Some(pm) = &options.package_manager {
            args.push(format!("--packageManager={}", pm));
        }
        if options.ignore_policy {
            args.push("--ignore-policy".to_string());
        }
        args
    }
}

/// A multi-project run prints an array; the wizard handles the first.
pub fn parse_scan_output(text: &str) -> Result<ScanResult, WizardError> {
    let value: Value = serde_json::from_str(text.trim())?;
    let value = match value {
        Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
        Value::Array(_) => {
            return Err(WizardError::Internal("Scan produced no results".into()));
        }
        other => other,
    };
    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(WizardError::Internal(format!("Scan failed: {}", message)));
    }
    Ok(serde_json::from_value(value)?)
}

#[async_trait]
impl Scanner for CommandScanner {
    async fn test(&self, cwd: &Path, options: &ScanOptions) -> Result<ScanResult, WizardError> {
        if let Some(path) = &self.saved_result {
            let path = if path.is_absolute() { path.clone() } else { cwd.join(path) };
            debug!(file = %path.display(), "Reading saved scan result");
            let text = tokio::fs::read_to_string(&path).await?;
            return parse_scan_output(&text);
        }

        let output = self.runner.run(&self.tool, &Self::args(options), cwd).await?;
        // Exit status 1 only means vulnerabilities were found.
        if output.stdout.trim().is_empty() {
            return Err(WizardError::Process(format!(
                "{} test exited with status {}: {}",
                self.tool,
                output.status,
                output.stderr.trim()
            )));
        }
        parse_scan_output(&output.stdout)
    }
}
