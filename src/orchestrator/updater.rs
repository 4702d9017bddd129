//! Per-commit documentation update loop

use std::collections::HashSet;
use std::fmt::Display;

use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::{DocTarget, Summary, UpdaterDeps, build_prompt};
use crate::config::Config;
use crate::constants::content::{DOC_FILE_MODE, FALLBACK_DOC_FILE, MAX_SECTION_CHARS};
use crate::doc::{atomic_write_file, detect_line_ending, normalize_line_endings};
use crate::storage::prompt_fingerprint;
use crate::types::{
    CommitStatus, EventLevel, GenerationCacheEntry, GitDocError, PlanStatus, PlanStrategy,
    Result, RunId, ValidationError, ValidationErrorKind,
};

/// Drives commits through the documentation pipeline
pub struct Updater {
    deps: UpdaterDeps,
}

impl Updater {
    pub fn new(deps: UpdaterDeps) -> Self {
        Self { deps }
    }

    pub fn config(&self) -> &Config {
        &self.deps.config
    }

    /// Process commits left unfinished by earlier runs, then every commit
    /// after the last successful one up to HEAD.
    pub async fn update_new_commits(
        &self,
        cancel: &CancellationToken,
        dry_run: bool,
    ) -> Result<Summary> {
        let resumable = self.deps.store.resumable_commits()?;
        let last = self.deps.store.last_processed_commit()?.unwrap_or_default();
        let head = self.deps.commit_source.current_head().await?;

        let discovered = self.deps.commit_source.commit_range(&last, &head).await?;
        debug!(
            resumable = resumable.len(),
            discovered = discovered.len(),
            from = %last,
            to = %head,
            "Resolved commits to update"
        );

        let commits = merge_unique(resumable, discovered.into_iter().map(|c| c.hash));
        self.update_commit_list(cancel, &commits, dry_run).await
    }

    /// Process the commits in `from..to`; a blank `to` means HEAD.
    pub async fn update_range_commits(
        &self,
        cancel: &CancellationToken,
        from: &str,
        to: &str,
        dry_run: bool,
    ) -> Result<Summary> {
        let from = from.trim();
        let to = match to.trim() {
            "" => self.deps.commit_source.current_head().await?,
            to => to.to_string(),
        };

        let range = self.deps.commit_source.commit_range(from, &to).await?;
        let commits: Vec<String> = range.into_iter().map(|c| c.hash).collect();
        self.update_commit_list(cancel, &commits, dry_run).await
    }

    /// Process `commits` in order. A commit's failure is recorded and the
    /// loop continues with the next one.
    pub async fn update_commit_list(
        &self,
        cancel: &CancellationToken,
        commits: &[String],
        dry_run: bool,
    ) -> Result<Summary> {
        let run_id = RunId::generate();
        let mut summary = Summary::default();

        info!(run_id = %run_id, commits = commits.len(), dry_run, "Update run started");
        self.event(
            &run_id,
            None,
            EventLevel::Info,
            "orchestrator",
            "update loop started",
            Some(json!({ "commits": commits.len(), "dry_run": dry_run })),
        );

        for hash in commits {
            if let Err(err) =
                self.deps
                    .store
                    .mark_commit_processed(hash, CommitStatus::Pending, None, None, &[])
            {
                warn!(commit = %hash, error = %err, "Failed to mark commit pending");
                self.event(
                    &run_id,
                    Some(hash),
                    EventLevel::Error,
                    "state",
                    "failed to mark pending",
                    Some(json!({ "error": err.to_string() })),
                );
                summary.record(CommitStatus::Failed);
                continue;
            }

            let status = match self
                .process_single_commit(cancel, &run_id, hash, dry_run)
                .await
            {
                Ok(status) => status,
                Err(err) => {
                    warn!(commit = %hash, error = %err, "Commit processing failed");
                    self.best_effort(
                        "record failed commit",
                        self.deps.store.mark_commit_processed(
                            hash,
                            CommitStatus::Failed,
                            Some(&err.to_string()),
                            None,
                            &[],
                        ),
                    );
                    self.event(
                        &run_id,
                        Some(hash),
                        EventLevel::Error,
                        "orchestrator",
                        "commit processing failed",
                        Some(json!({ "error": err.to_string() })),
                    );
                    CommitStatus::Failed
                }
            };
            summary.record(status);
        }

        info!(run_id = %run_id, %summary, "Update run finished");
        self.event(
            &run_id,
            None,
            EventLevel::Info,
            "orchestrator",
            "update loop finished",
            Some(json!(summary)),
        );
        Ok(summary)
    }

    #[instrument(skip(self, cancel, run_id), fields(run_id = %run_id))]
    async fn process_single_commit(
        &self,
        cancel: &CancellationToken,
        run_id: &RunId,
        hash: &str,
        dry_run: bool,
    ) -> Result<CommitStatus> {
        let store = &self.deps.store;
        let source = &self.deps.commit_source;

        store.mark_commit_processed(hash, CommitStatus::InProgress, None, None, &[])?;

        let changed = source.changed_files(hash).await?;
        if changed.is_empty() {
            debug!("No changed files");
            store.mark_commit_processed(hash, CommitStatus::Skipped, None, None, &[])?;
            return Ok(CommitStatus::Skipped);
        }

        let message = source.message(hash).await?;
        let diff = source.diff(hash).await?;

        let target = resolve_target(&self.deps.config, &changed);
        let DocTarget { doc_file, section } = &target;

        let path = source.repo_root().join(doc_file);
        let original = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GitDocError::DocNotFound(doc_file.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        if let Err(err) = store.upsert_planned_update(
            hash,
            doc_file,
            section,
            PlanStrategy::Inferred,
            PlanStatus::Planned,
            None,
        ) {
            warn!(error = %err, "Failed to persist planned update");
            self.event(
                run_id,
                Some(hash),
                EventLevel::Warn,
                "state",
                "failed to persist planned update",
                Some(json!({ "error": err.to_string() })),
            );
        }

        let prompt = build_prompt(&message, &diff);
        let provider = self.deps.client.name().to_string();
        let model = self.deps.config.llm.model.clone();

        let cached = match store.cached_generation_response(
            hash, doc_file, section, &provider, &model, &prompt,
        ) {
            Ok(cached) => cached,
            Err(err) => {
                warn!(error = %err, "Failed to read llm cache");
                self.event(
                    run_id,
                    Some(hash),
                    EventLevel::Warn,
                    "state",
                    "failed to read llm cache",
                    Some(json!({ "error": err.to_string() })),
                );
                None
            }
        };

        let generated = match cached {
            Some(text) => {
                debug!(%doc_file, %section, "LLM cache hit");
                self.event(
                    run_id,
                    Some(hash),
                    EventLevel::Info,
                    "llm",
                    "cache hit",
                    Some(json!({ "doc_file": doc_file, "section": section })),
                );
                text
            }
            None => {
                let text = match self.deps.client.generate(cancel, &prompt).await {
                    Ok(text) => text,
                    Err(err) => return Err(self.fail_plan(hash, &target, err)),
                };
                self.best_effort(
                    "store llm cache entry",
                    store.put_cached_generation_response(&GenerationCacheEntry {
                        commit_hash: hash.to_string(),
                        doc_file: doc_file.clone(),
                        section_id: section.clone(),
                        provider,
                        model,
                        prompt_hash: prompt_fingerprint(&prompt),
                        response_text: text.clone(),
                    }),
                );
                text
            }
        };

        if let Err(err) = validate_generated_section(&generated) {
            return Err(self.fail_plan(hash, &target, err));
        }

        let updated = match self
            .deps
            .doc_updater
            .replace_section(&original, section, &generated)
        {
            Ok(updated) => normalize_line_endings(&updated, detect_line_ending(&original)),
            Err(err) => return Err(self.fail_plan(hash, &target, err)),
        };

        if updated.trim() == original.trim() {
            debug!(%doc_file, "Generated section matches current document");
            self.best_effort(
                "record unchanged plan",
                store.upsert_planned_update(
                    hash,
                    doc_file,
                    section,
                    PlanStrategy::Inferred,
                    PlanStatus::Unchanged,
                    Some("no document delta"),
                ),
            );
            store.mark_commit_processed(hash, CommitStatus::Skipped, None, None, &[])?;
            return Ok(CommitStatus::Skipped);
        }

        let changed_docs = vec![doc_file.clone()];

        if dry_run {
            info!(%doc_file, %section, "Dry run: document would change");
            self.best_effort(
                "record dry-run plan",
                store.upsert_planned_update(
                    hash,
                    doc_file,
                    section,
                    PlanStrategy::Inferred,
                    PlanStatus::Applied,
                    Some("dry-run"),
                ),
            );
            store.mark_commit_processed(hash, CommitStatus::Success, None, None, &changed_docs)?;
            return Ok(CommitStatus::Success);
        }

        if let Err(err) = atomic_write_file(&path, updated.as_bytes(), DOC_FILE_MODE) {
            return Err(self.fail_plan(hash, &target, err));
        }

        let git = &self.deps.config.git;
        let doc_commit = if !git.commit_doc_updates {
            String::new()
        } else {
            let committed = if git.amend_original {
                source.stage_and_amend(&changed_docs).await
            } else {
                source
                    .stage_and_commit(&changed_docs, &git.commit_message_for(hash))
                    .await
            };
            match committed {
                Ok(doc_commit) => doc_commit,
                Err(err) => return Err(self.fail_plan(hash, &target, err)),
            }
        };

        store.mark_commit_processed(
            hash,
            CommitStatus::Success,
            None,
            Some(&doc_commit),
            &changed_docs,
        )?;
        store.store_mapping(hash, doc_file, section)?;
        self.best_effort(
            "record applied plan",
            store.upsert_planned_update(
                hash,
                doc_file,
                section,
                PlanStrategy::Inferred,
                PlanStatus::Applied,
                None,
            ),
        );

        info!(%doc_file, %section, doc_commit = %doc_commit, "Documentation updated");
        Ok(CommitStatus::Success)
    }

    /// Mark the plan for `target` failed with `err`'s text, then hand `err` back.
    fn fail_plan(&self, hash: &str, target: &DocTarget, err: GitDocError) -> GitDocError {
        self.best_effort(
            "record failed plan",
            self.deps.store.upsert_planned_update(
                hash,
                &target.doc_file,
                &target.section,
                PlanStrategy::Inferred,
                PlanStatus::Failed,
                Some(&err.to_string()),
            ),
        );
        err
    }

    /// Swallow a failed side effect after logging it.
    fn best_effort<E: Display>(&self, what: &str, result: std::result::Result<(), E>) {
        if let Err(err) = result {
            warn!(error = %err, "Best-effort step failed: {}", what);
        }
    }

    fn event(
        &self,
        run_id: &RunId,
        commit: Option<&str>,
        level: EventLevel,
        component: &str,
        message: &str,
        metadata: Option<serde_json::Value>,
    ) {
        self.best_effort(
            "log run event",
            self.deps.store.log_run_event(
                run_id.as_str(),
                commit,
                level,
                component,
                message,
                metadata.as_ref(),
            ),
        );
    }
}

/// Doc file and section for a commit touching `changed`.
///
/// For each changed path in order, the first mapping whose pattern (with `*`
/// stripped) occurs in the path wins. Otherwise the first configured doc
/// file with the default section, or `README.md` when none is configured.
pub fn resolve_target(config: &Config, changed: &[String]) -> DocTarget {
    for path in changed {
        for rule in &config.mappings {
            let pattern = rule.code_pattern.trim_matches('*');
            if path.contains(pattern) {
                return DocTarget {
                    doc_file: rule.doc_file.clone(),
                    section: rule.section.clone(),
                };
            }
        }
    }

    let doc_file = config
        .doc_files
        .first()
        .cloned()
        .unwrap_or_else(|| FALLBACK_DOC_FILE.to_string());
    DocTarget {
        doc_file,
        section: config.runtime.default_section.clone(),
    }
}

/// Reject blank or oversized generated section content.
pub fn validate_generated_section(content: &str) -> Result<()> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::new(
            ValidationErrorKind::Empty,
            "generated section content is empty",
        )
        .into());
    }
    if trimmed.chars().count() > MAX_SECTION_CHARS {
        return Err(ValidationError::new(
            ValidationErrorKind::TooLarge,
            "generated section content exceeds max size",
        )
        .into());
    }
    Ok(())
}

/// `first` then `rest`, dropping blanks and repeats; first occurrence wins.
pub fn merge_unique(first: Vec<String>, rest: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .into_iter()
        .chain(rest)
        .filter(|hash| !hash.trim().is_empty())
        .filter(|hash| seen.insert(hash.clone()))
        .collect()
}
