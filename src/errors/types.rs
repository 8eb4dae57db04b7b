use thiserror::Error;

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Snyk wizard for {0} projects is not currently supported")]
    UnsupportedPackageManager(String),

    #[error("Missing node_modules folder: we can't patch without having installed packages.\nPlease run '{0} install' first.")]
    MissingDependencies(String),

    #[error("Could not detect supported target files in {0}.\nPlease see our documentation for supported languages and target files.")]
    MissingTargetFile(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Snyk is missing auth token in order to run inside CI. You must include your API token as an environment value: `SNYK_TOKEN=12345678`")]
    MisconfiguredAuthInCi,

    #[error("Answer key collision: {0} is already present")]
    KeyCollision(String),

    #[error("Prompt error: {0}")]
    Prompt(String),

    #[error("Update failed: {0}")]
    UpdateFailed(String),

    #[error("Process error: {0}")]
    Process(String),

    #[error("Policy error: {0}")]
    Policy(String),

    #[error("Manifest error: {0}")]
    Manifest(String),

    #[error("Monitor error: {0}")]
    Monitor(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Git error: {0}")]
    Git(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}
