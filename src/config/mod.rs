pub mod parser;
pub mod schema;
pub mod types;

pub use types::*;
pub use parser::{load_project_config, parse_config};
