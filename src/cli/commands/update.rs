//! Update Command
//!
//! Process new commits (or an explicit range) under the run lock.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{CommandContext, GlobalOptions, Output};
use crate::runlock::RunLock;
use crate::types::{GitDocError, Result};

#[derive(Debug, Clone, Default)]
pub struct UpdateArgs {
    /// Range start, exclusive
    pub from: Option<String>,
    /// Range end, inclusive; HEAD when absent
    pub to: Option<String>,
    /// Invoked by a git hook: a concurrent run is not an error
    pub from_hook: bool,
}

impl UpdateArgs {
    fn range(&self) -> Option<(&str, &str)> {
        let from = self.from.as_deref().map(str::trim).unwrap_or_default();
        let to = self.to.as_deref().map(str::trim).unwrap_or_default();
        (!from.is_empty() || !to.is_empty()).then_some((from, to))
    }
}

pub async fn run(
    opts: &GlobalOptions,
    args: &UpdateArgs,
    cancel: &CancellationToken,
    out: &Output,
) -> Result<()> {
    let ctx = CommandContext::load(opts).await?;

    let lock = match RunLock::acquire(&ctx.repo_root) {
        Ok(lock) => lock,
        Err(GitDocError::AlreadyRunning { pid }) if args.from_hook => {
            debug!(pid, "Another run is active, skipping hook invocation");
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    let updater = ctx.updater()?;
    let summary = match args.range() {
        Some((from, to)) => {
            updater
                .update_range_commits(cancel, from, to, opts.dry_run)
                .await?
        }
        None => updater.update_new_commits(cancel, opts.dry_run).await?,
    };

    lock.release()?;
    out.summary("processed", &summary);
    if summary.failed > 0 {
        out.warning("Some commits failed; see 'git-doc status' and 'git-doc retry'");
    }
    Ok(())
}
