//! `git` command-line backed commit source

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::process::Command;
use tracing::debug;

use super::{CommitInfo, CommitSource};
use crate::types::{GitDocError, Result};

const LOG_FORMAT: &str = "--pretty=format:%H|%an|%ae|%at|%s";

/// Runs `git` subcommands inside a repository root
#[derive(Debug, Clone)]
pub struct GitCli {
    repo_root: PathBuf,
}

impl GitCli {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }

    /// Locate the repository containing `start`.
    pub async fn discover(start: &Path) -> Result<Self> {
        let root = run_git(start, &["rev-parse", "--show-toplevel"]).await?;
        Ok(Self::new(root.trim()))
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        run_git(&self.repo_root, args).await
    }

    async fn stage(&self, paths: &[String]) -> Result<()> {
        let mut args = vec!["add", "--"];
        args.extend(paths.iter().map(String::as_str));
        self.run(&args).await.map(|_| ())
    }
}

async fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    debug!(dir = %dir.display(), args = ?args, "Running git");

    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| GitDocError::Git {
            command: args.join(" "),
            message: format!("failed to spawn git: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = if stderr.trim().is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr.trim().to_string()
        };
        return Err(GitDocError::Git {
            command: args.join(" "),
            message,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Parse `git log` output in `%H|%an|%ae|%at|%s` format.
///
/// Lines without all five fields are skipped; the subject may contain `|`.
pub fn parse_log_output(out: &str) -> Result<Vec<CommitInfo>> {
    out.trim()
        .lines()
        .filter_map(|line| {
            let parts: Vec<&str> = line.splitn(5, '|').collect();
            let [hash, author, email, ts, subject] = parts.as_slice() else {
                return None;
            };
            Some((*hash, *author, *email, *ts, *subject))
        })
        .map(|(hash, author, email, ts, subject)| -> Result<CommitInfo> {
            let secs: i64 = ts.trim().parse().map_err(|e| GitDocError::Git {
                command: "log".to_string(),
                message: format!("invalid unix timestamp {:?}: {}", ts, e),
            })?;
            let timestamp =
                DateTime::<Utc>::from_timestamp(secs, 0).ok_or_else(|| GitDocError::Git {
                    command: "log".to_string(),
                    message: format!("unix timestamp out of range: {}", secs),
                })?;
            Ok(CommitInfo {
                hash: hash.to_string(),
                author: author.to_string(),
                email: email.to_string(),
                timestamp,
                subject: subject.to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl CommitSource for GitCli {
    fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    async fn current_head(&self) -> Result<String> {
        Ok(self.run(&["rev-parse", "HEAD"]).await?.trim().to_string())
    }

    async fn commit_range(&self, from: &str, to: &str) -> Result<Vec<CommitInfo>> {
        let range = if from.is_empty() {
            to.to_string()
        } else {
            format!("{}..{}", from, to)
        };
        let out = self.run(&["log", LOG_FORMAT, "--reverse", &range]).await?;
        parse_log_output(&out)
    }

    async fn diff(&self, commit: &str) -> Result<String> {
        self.run(&["show", "--unified=3", commit]).await
    }

    async fn message(&self, commit: &str) -> Result<String> {
        Ok(self
            .run(&["log", "-1", "--pretty=%B", commit])
            .await?
            .trim()
            .to_string())
    }

    async fn changed_files(&self, commit: &str) -> Result<Vec<String>> {
        let out = self
            .run(&["diff-tree", "--root", "--no-commit-id", "--name-only", "-r", commit])
            .await?;
        Ok(out
            .lines()
            .map(|line| line.trim().replace('\\', "/"))
            .filter(|line| !line.is_empty())
            .collect())
    }

    async fn stage_and_commit(&self, paths: &[String], message: &str) -> Result<String> {
        if paths.is_empty() {
            return Ok(String::new());
        }
        self.stage(paths).await?;
        self.run(&["commit", "-m", message]).await?;
        self.current_head().await
    }

    async fn stage_and_amend(&self, paths: &[String]) -> Result<String> {
        if paths.is_empty() {
            return Ok(String::new());
        }
        self.stage(paths).await?;
        self.run(&["commit", "--amend", "--no-edit"]).await?;
        self.current_head().await
    }

    async fn revert(&self, commit: &str) -> Result<()> {
        self.run(&["revert", "--no-edit", commit]).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_log_output() {
        let out = "aaa|Ada|ada@example.com|1700000000|feat: add | pipes\nbroken line\nbbb|Bob|bob@example.com|1700000100|fix\n";
        let commits = parse_log_output(out).unwrap();
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "aaa");
        assert_eq!(commits[0].subject, "feat: add | pipes");
        assert_eq!(commits[0].timestamp.timestamp(), 1_700_000_000);
        assert_eq!(commits[1].author, "Bob");

        assert!(parse_log_output("").unwrap().is_empty());
        assert!(parse_log_output("a|b|c|notanumber|s").is_err());
    }

    fn git_available() -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    async fn init_repo(dir: &Path) -> GitCli {
        let git = GitCli::new(dir);
        git.run(&["init", "-q"]).await.unwrap();
        git.run(&["config", "user.name", "Test"]).await.unwrap();
        git.run(&["config", "user.email", "test@example.com"]).await.unwrap();
        git.run(&["config", "commit.gpgsign", "false"]).await.unwrap();
        git
    }

    async fn commit_file(git: &GitCli, path: &str, content: &str, message: &str) -> String {
        let full = git.repo_root().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
        git.stage_and_commit(&[path.to_string()], message).await.unwrap()
    }

    #[tokio::test]
    async fn test_git_cli_against_real_repo() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let git = init_repo(dir.path()).await;

        let c1 = commit_file(&git, "README.md", "# Title\n", "init").await;
        let c2 = commit_file(&git, "src/a.txt", "hello\n", "feat: add a").await;
        assert_eq!(git.current_head().await.unwrap(), c2);

        let all = git.commit_range("", &c2).await.unwrap();
        assert_eq!(
            all.iter().map(|c| c.hash.as_str()).collect::<Vec<_>>(),
            vec![c1.as_str(), c2.as_str()]
        );
        let after = git.commit_range(&c1, &c2).await.unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].subject, "feat: add a");

        assert_eq!(git.changed_files(&c2).await.unwrap(), vec!["src/a.txt"]);
        assert_eq!(git.message(&c2).await.unwrap(), "feat: add a");
        assert!(git.diff(&c2).await.unwrap().contains("+hello"));

        fs::write(dir.path().join("README.md"), "# Title\nmore\n").unwrap();
        let amended = git.stage_and_amend(&["README.md".to_string()]).await.unwrap();
        assert_ne!(amended, c2);
        assert_eq!(git.message(&amended).await.unwrap(), "feat: add a");

        git.revert(&amended).await.unwrap();
        assert!(!dir.path().join("src/a.txt").exists());
    }

    #[tokio::test]
    async fn test_git_errors_carry_command() {
        if !git_available() {
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        let git = init_repo(dir.path()).await;

        let err = git.message("deadbeef").await.unwrap_err();
        match err {
            GitDocError::Git { command, .. } => assert_eq!(command, "log -1 --pretty=%B deadbeef"),
            other => panic!("unexpected error: {other}"),
        }
        assert!(git.stage_and_commit(&[], "x").await.unwrap().is_empty());
    }
}
