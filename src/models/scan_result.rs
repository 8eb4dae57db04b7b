use serde::{Deserialize, Serialize};
use super::finding::Finding;

/// Result of testing a project for known vulnerabilities.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub ok: bool,
    #[serde(default)]
    pub vulnerabilities: Vec<Finding>,
    #[serde(default)]
    pub dependency_count: usize,
    #[serde(default)]
    pub unique_count: usize,
    /// Policy text the scan was evaluated against.
    #[serde(default)]
    pub policy: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,
}

impl ScanResult {
    pub fn total_findings(&self) -> usize {
        self.vulnerabilities.len()
    }

    /// One-line description of what the scan found.
    pub fn headline(&self) -> String {
        if self.ok {
            return format!(
                "Tested {} dependencies for known vulnerabilities, no vulnerable paths found.",
                self.dependency_count
            );
        }
        let count = self.vulnerabilities.len();
        let paths = if count == 1 { "path" } else { "paths" };
        let ies = if self.unique_count == 1 { "y" } else { "ies" };
        format!(
            "Tested {} dependencies for known vulnerabilities, found {} vulnerabilit{}, {} vulnerable {}.",
            self.dependency_count, self.unique_count, ies, count, paths
        )
    }
}
