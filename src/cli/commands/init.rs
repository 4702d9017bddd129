//! Init Command
//!
//! Create `.git-doc/` in the current repository with a starter config.

use crate::cli::Output;
use crate::cli::util::discover_repo;
use crate::config::ConfigLoader;
use crate::git::CommitSource;
use crate::types::Result;

pub async fn run(out: &Output) -> Result<()> {
    let git = discover_repo().await?;
    let root = git.repo_root();

    let (config_path, created) = ConfigLoader::init_project(root)?;
    let data_dir = ConfigLoader::project_dir(root);

    if created {
        out.success(&format!("Initialized git-doc at {}", data_dir.display()));
    } else {
        out.info(&format!("Already initialized at {}", data_dir.display()));
    }
    out.info(&format!("Config: {}", config_path.display()));
    out.info("Next: edit the config, then run 'git-doc update'");

    Ok(())
}
