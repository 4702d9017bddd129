//! Revert Command
//!
//! Undo the documentation commit produced for a code commit.

use crate::cli::{CommandContext, GlobalOptions, Output};
use crate::git::CommitSource;
use crate::types::{GitDocError, Result};

pub async fn run(opts: &GlobalOptions, code_commit: &str, out: &Output) -> Result<()> {
    let ctx = CommandContext::load(opts).await?;
    let code_commit = code_commit.trim();

    let doc_commit = ctx
        .store
        .doc_commit_hash(code_commit)?
        .ok_or_else(|| GitDocError::NoDocCommit(code_commit.to_string()))?;

    if opts.dry_run {
        out.plain(&format!(
            "dry-run: would revert doc commit {} (for code commit {})",
            doc_commit, code_commit
        ));
        return Ok(());
    }

    ctx.git.revert(&doc_commit).await?;
    out.success(&format!("Reverted doc commit {}", doc_commit));
    Ok(())
}
