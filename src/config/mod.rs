//! Configuration Management
//!
//! Resolution order (later wins):
//! 1. Built-in defaults
//! 2. Project config (.git-doc/config.toml)
//! 3. Environment variables (GITDOC_*)

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::*;
