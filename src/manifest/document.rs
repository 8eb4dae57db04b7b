use std::path::Path;

use serde_json::{Map, Value};

use crate::errors::WizardError;

pub const MANIFEST_FILE: &str = "package.json";

/// Script name → shell command, in manifest order.
pub type Scripts = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencySection {
    Dependencies,
    DevDependencies,
    PeerDependencies,
    OptionalDependencies,
}

impl DependencySection {
    pub fn key(&self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::PeerDependencies => "peerDependencies",
            Self::OptionalDependencies => "optionalDependencies",
        }
    }
}

/// A parsed `package.json`. Key order and surrounding whitespace of the
/// source text are preserved on write-back.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectManifest {
    doc: Map<String, Value>,
    leading: String,
    trailing: String,
}

impl ProjectManifest {
    pub fn parse(text: &str) -> Result<Self, WizardError> {
        let body = text.trim();
        let start = text.len() - text.trim_start().len();
        let leading = text[..start].to_string();
        let trailing = text[start + body.len()..].to_string();
        let value: Value = serde_json::from_str(body)
            .map_err(|e| WizardError::Manifest(format!("Invalid {}: {}", MANIFEST_FILE, e)))?;
        match value {
            Value::Object(doc) => Ok(Self { doc, leading, trailing }),
            _ => Err(WizardError::Manifest(format!(
                "{} must contain a JSON object",
                MANIFEST_FILE
            ))),
        }
    }

    pub async fn read(path: &Path) -> Result<Self, WizardError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            WizardError::Manifest(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::parse(&text)
    }

    pub fn to_json_string(&self) -> Result<String, WizardError> {
        let body = serde_json::to_string_pretty(&self.doc)?;
        Ok(format!("{}{}{}", self.leading, body, self.trailing))
    }

    pub async fn write(&self, path: &Path) -> Result<(), WizardError> {
        tokio::fs::write(path, self.to_json_string()?).await?;
        Ok(())
    }

    pub fn name(&self) -> Option<&str> {
        self.doc.get("name").and_then(Value::as_str)
    }

    pub fn version(&self) -> Option<&str> {
        self.doc.get("version").and_then(Value::as_str)
    }

    pub fn script(&self, name: &str) -> Option<&str> {
        self.doc
            .get("scripts")
            .and_then(Value::as_object)
            .and_then(|s| s.get(name))
            .and_then(Value::as_str)
    }

    pub fn scripts(&self) -> Scripts {
        self.doc
            .get("scripts")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }

    pub fn with_scripts(mut self, scripts: Scripts) -> Self {
        self.doc.insert("scripts".to_string(), Value::Object(scripts));
        self
    }

    pub fn section(&self, section: DependencySection) -> Option<&Map<String, Value>> {
        self.doc.get(section.key()).and_then(Value::as_object)
    }

    pub fn dependency(&self, section: DependencySection, name: &str) -> Option<&str> {
        self.section(section)
            .and_then(|deps| deps.get(name))
            .and_then(Value::as_str)
    }

    /// Set `name` in `section`; peer and optional sections are never written.
    pub fn with_dependency(mut self, section: DependencySection, name: &str, version: &str) -> Self {
        if matches!(
            section,
            DependencySection::PeerDependencies | DependencySection::OptionalDependencies
        ) {
            return self;
        }
        let entry = self
            .doc
            .entry(section.key().to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        if let Value::Object(deps) = entry {
            deps.insert(name.to_string(), Value::String(version.to_string()));
        }
        self
    }

    pub fn without_dependency(mut self, section: DependencySection, name: &str) -> Self {
        if let Some(Value::Object(deps)) = self.doc.get_mut(section.key()) {
            deps.remove(name);
        }
        self
    }

    /// Top-level `"<tool>": true` flag telling the tool protection is wired up.
    pub fn protection_marker(&self, tool: &str) -> bool {
        self.doc.get(tool).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn with_protection_marker(mut self, tool: &str) -> Self {
        self.doc.insert(tool.to_string(), Value::Bool(true));
        self
    }
}
