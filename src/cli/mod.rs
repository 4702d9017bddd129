//! Command-line surface
//!
//! Thin handlers over the library: each command resolves a
//! [`CommandContext`], calls into the orchestrator or state store, and
//! reports through [`Output`].

pub mod commands;
pub mod ui;
pub mod util;

pub use ui::Output;
pub use util::{CommandContext, GlobalOptions, cancel_on_ctrl_c, config_path, discover_repo};
