//! Config Command
//!
//! Usage:
//!   git-doc config           print the resolved configuration as TOML
//!   git-doc config --path    print the config file path
//!   git-doc config --edit    open the config file in $VISUAL / $EDITOR

use std::process::Command;

use crate::cli::util::{config_path, discover_repo};
use crate::cli::{GlobalOptions, Output};
use crate::config::ConfigLoader;
use crate::git::CommitSource;
use crate::types::{GitDocError, Result};

pub async fn run(opts: &GlobalOptions, show_path: bool, edit: bool, out: &Output) -> Result<()> {
    let git = discover_repo().await?;
    let path = config_path(git.repo_root(), opts);

    if show_path {
        out.plain(&path.display().to_string());
        return Ok(());
    }

    if edit {
        return open_in_editor(&path);
    }

    let config = ConfigLoader::load_from_file(&path)?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| GitDocError::Config(format!("failed to render config: {}", e)))?;
    out.plain(rendered.trim_end());
    Ok(())
}

fn no_editor() -> GitDocError {
    GitDocError::Config("no editor configured; set VISUAL or EDITOR".to_string())
}

fn open_in_editor(path: &std::path::Path) -> Result<()> {
    let editor = ["VISUAL", "EDITOR"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|value| value.trim().to_string())
        .find(|value| !value.is_empty())
        .ok_or_else(no_editor)?;

    let mut parts = editor.split_whitespace();
    let program = parts.next().ok_or_else(no_editor)?;

    let status = Command::new(program).args(parts).arg(path).status()?;
    if !status.success() {
        return Err(GitDocError::Config(format!("editor exited with {}", status)));
    }
    Ok(())
}
