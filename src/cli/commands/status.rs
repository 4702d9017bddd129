//! Status Command
//!
//! Aggregate counts and the most recently processed commits.

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::cli::{CommandContext, GlobalOptions, Output};
use crate::types::{ProcessedCommit, Result, StatusCounts};

#[derive(Debug, Serialize)]
struct StatusReport<'a> {
    generated_at: String,
    counts: StatusCounts,
    recent: &'a [ProcessedCommit],
}

pub async fn run(opts: &GlobalOptions, json: bool, limit: usize, out: &Output) -> Result<()> {
    let ctx = CommandContext::load(opts).await?;
    let rows = ctx.store.list_recent(limit)?;
    let counts = ctx.store.status_counts()?;

    if json {
        let report = StatusReport {
            generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            counts,
            recent: &rows,
        };
        out.plain(&serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    out.counts(&counts);
    if !rows.is_empty() {
        out.section("Recent commits");
    }
    for row in &rows {
        out.commit_row(row);
    }
    Ok(())
}
