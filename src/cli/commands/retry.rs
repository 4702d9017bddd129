//! Retry Command
//!
//! Reprocess one commit, or every failed or interrupted one.

use tokio_util::sync::CancellationToken;

use crate::cli::{CommandContext, GlobalOptions, Output};
use crate::runlock::RunLock;
use crate::types::Result;

pub async fn run(
    opts: &GlobalOptions,
    commit: Option<&str>,
    cancel: &CancellationToken,
    out: &Output,
) -> Result<()> {
    let ctx = CommandContext::load(opts).await?;
    let lock = RunLock::acquire(&ctx.repo_root)?;

    let commits = match commit.map(str::trim).filter(|c| !c.is_empty()) {
        Some(commit) => vec![commit.to_string()],
        None => ctx.store.retryable_commits()?,
    };

    if commits.is_empty() {
        out.info("Nothing to retry");
    }

    let summary = ctx
        .updater()?
        .update_commit_list(cancel, &commits, opts.dry_run)
        .await?;

    lock.release()?;
    out.summary("retried", &summary);
    Ok(())
}
