pub mod types;
pub mod classification;

pub use types::WizardError;
pub use classification::ErrorClassification;
