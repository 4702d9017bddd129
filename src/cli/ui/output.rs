use console::style;

use crate::orchestrator::Summary;
use crate::types::{CommitStatus, ProcessedCommit, StatusCounts};

/// Styled terminal output; `quiet` suppresses everything but errors.
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    /// Machine-readable line, printed even in quiet mode
    pub fn plain(&self, message: &str) {
        println!("{}", message);
    }

    pub fn section(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold());
            println!("{}", "─".repeat(40));
        }
    }

    /// `processed=… success=… failed=… skipped=…`, with the failure count
    /// highlighted when non-zero.
    pub fn summary(&self, label: &str, summary: &Summary) {
        let failed = if summary.failed > 0 {
            style(summary.failed.to_string()).red().to_string()
        } else {
            summary.failed.to_string()
        };
        self.plain(&format!(
            "{}={} success={} failed={} skipped={}",
            label, summary.processed, summary.success, failed, summary.skipped
        ));
    }

    pub fn counts(&self, counts: &StatusCounts) {
        self.plain(&format!(
            "pending={} in_progress={} success={} failed={} skipped={} total={}",
            counts.pending,
            counts.in_progress,
            counts.success,
            counts.failed,
            counts.skipped,
            counts.total
        ));
    }

    pub fn commit_row(&self, row: &ProcessedCommit) {
        let status = match row.status {
            CommitStatus::Success => style(row.status.as_str()).green(),
            CommitStatus::Failed => style(row.status.as_str()).red(),
            CommitStatus::Skipped => style(row.status.as_str()).dim(),
            CommitStatus::Pending | CommitStatus::InProgress => style(row.status.as_str()).yellow(),
        };
        let mut line = format!("{} {} {}", row.commit_hash, status, row.processed_at);
        if let Some(error) = &row.error {
            line.push_str(&format!("  {}", style(error).dim()));
        }
        self.plain(&line);
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new(false)
    }
}
