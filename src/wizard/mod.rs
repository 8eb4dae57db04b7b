pub mod banner;
pub mod coordinator;
pub mod orchestrator;
pub mod summary;

pub use coordinator::{SideEffectReport, SideEffects};
pub use orchestrator::{run_wizard, Collaborators, WizardOptions, WizardOutcome};
