pub mod record;
pub mod store;
pub mod synthesize;
pub mod display;

pub use record::{PathRule, PolicyRecord, RuleMeta};
pub use store::{policy_path, FilePolicyStore, PolicyStore};
pub use synthesize::{synthesize, InstallPlan, Synthesis};
pub use display::display;
