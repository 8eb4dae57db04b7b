use super::types::WizardError;

#[derive(Debug, Clone)]
pub struct ErrorClassification {
    pub error_type: &'static str,
    /// Raised before any prompting; nothing on disk has been touched.
    pub precondition: bool,
    pub exit_code: i32,
}

impl WizardError {
    /// Classify this error to determine its type and the process exit code.
    pub fn classify(&self) -> ErrorClassification {
        match self {
            // Precondition failures
            WizardError::UnsupportedPackageManager(_) => ErrorClassification {
                error_type: "UnsupportedPackageManagerError",
                precondition: true,
                exit_code: 2,
            },
            WizardError::MissingDependencies(_) => ErrorClassification {
                error_type: "MissingDependenciesError",
                precondition: true,
                exit_code: 2,
            },
            WizardError::MissingTargetFile(_) => ErrorClassification {
                error_type: "MissingTargetFileError",
                precondition: true,
                exit_code: 2,
            },
            WizardError::Config(_) => ErrorClassification {
                error_type: "ConfigError",
                precondition: true,
                exit_code: 2,
            },

            // Authentication
            WizardError::Authentication(_) => ErrorClassification {
                error_type: "AuthenticationError",
                precondition: true,
                exit_code: 4,
            },
            WizardError::MisconfiguredAuthInCi => ErrorClassification {
                error_type: "MisconfiguredAuthInCI",
                precondition: true,
                exit_code: 4,
            },

            // Subprocess failures
            WizardError::UpdateFailed(_) => ErrorClassification {
                error_type: "UpdateFailedError",
                precondition: false,
                exit_code: 3,
            },
            WizardError::Process(_) => ErrorClassification {
                error_type: "ProcessError",
                precondition: false,
                exit_code: 3,
            },

            WizardError::KeyCollision(_) => ErrorClassification {
                error_type: "KeyCollisionError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Prompt(_) => ErrorClassification {
                error_type: "PromptError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Policy(_) => ErrorClassification {
                error_type: "PolicyError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Manifest(_) => ErrorClassification {
                error_type: "ManifestError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Monitor(_) => ErrorClassification {
                error_type: "MonitorError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Network(_) => ErrorClassification {
                error_type: "NetworkError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Git(_) => ErrorClassification {
                error_type: "GitError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Io(_) => ErrorClassification {
                error_type: "IoError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Json(_) => ErrorClassification {
                error_type: "JsonError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Yaml(_) => ErrorClassification {
                error_type: "YamlError",
                precondition: false,
                exit_code: 1,
            },
            WizardError::Internal(_) => ErrorClassification {
                error_type: "InternalError",
                precondition: false,
                exit_code: 1,
            },
        }
    }
}
