pub mod cli;
pub mod config;
pub mod errors;
pub mod git;
pub mod manifest;
pub mod models;
pub mod package_manager;
pub mod policy;
pub mod process;
pub mod progress;
pub mod prompts;
pub mod remediation;
pub mod services;
pub mod wizard;
