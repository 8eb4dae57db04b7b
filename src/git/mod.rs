pub mod stage;

pub use stage::{stage_file, try_stage_file};
