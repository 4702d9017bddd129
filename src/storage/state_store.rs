//! Commit processing state
//!
//! Every write is a single upsert or insert keyed by natural identifiers,
//! so re-running any step after a crash converges on the same rows.

use std::path::Path;
use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use rusqlite::{OptionalExtension, Row, params};
use sha2::{Digest, Sha256};

use super::{Database, SharedDatabase};
use crate::constants::state::DEFAULT_LIST_LIMIT;
use crate::types::{
    CommitStatus, DocMapping, EventLevel, GenerationCacheEntry, GitDocError, ParseWithDefault,
    PlanStatus, PlanStrategy, PlannedUpdate, ProcessedCommit, Result, ResultExt, RunEvent,
    StatusCounts, log_filter_warn,
};

/// Current time as a fixed-width RFC 3339 string, so text order is time order.
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Hex SHA-256 of the fully assembled prompt text.
pub fn prompt_fingerprint(prompt: &str) -> String {
    let digest = Sha256::digest(prompt.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

fn null_if_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Clone)]
pub struct StateStore {
    db: SharedDatabase,
}

impl StateStore {
    pub fn new(db: SharedDatabase) -> Self {
        Self { db }
    }

    /// Open (creating if needed) and migrate the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(path)?;
        db.initialize()?;
        Ok(Self::new(Arc::new(db)))
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory()?;
        db.initialize()?;
        Ok(Self::new(Arc::new(db)))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Processed commits
    // =========================================================================

    /// Upsert the commit row, refreshing its timestamp.
    pub fn mark_commit_processed(
        &self,
        commit: &str,
        status: CommitStatus,
        error: Option<&str>,
        doc_commit: Option<&str>,
        changed_files: &[String],
    ) -> Result<()> {
        let files = serde_json::to_string(changed_files)?;
        self.db
            .connection()?
            .execute(
                r#"
                INSERT INTO processed_commits
                    (commit_hash, processed_at, status, error, doc_commit_hash, doc_files_changed)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                ON CONFLICT(commit_hash) DO UPDATE SET
                    processed_at = excluded.processed_at,
                    status = excluded.status,
                    error = excluded.error,
                    doc_commit_hash = excluded.doc_commit_hash,
                    doc_files_changed = excluded.doc_files_changed
                "#,
                params![
                    commit,
                    now_timestamp(),
                    status.as_str(),
                    null_if_empty(error),
                    null_if_empty(doc_commit),
                    files
                ],
            )
            .with_context_fn(|| format!("Failed to mark commit {} as {}", commit, status))?;
        Ok(())
    }

    pub fn get_commit(&self, commit: &str) -> Result<Option<ProcessedCommit>> {
        let conn = self.db.connection()?;
        let row = conn
            .query_row(
                "SELECT commit_hash, processed_at, status, error, doc_commit_hash, doc_files_changed, metadata
                 FROM processed_commits WHERE commit_hash = ?1",
                params![commit],
                Self::map_commit_row,
            )
            .optional()?;
        Ok(row)
    }

    /// Most recently processed commit whose status is success.
    pub fn last_processed_commit(&self) -> Result<Option<String>> {
        let conn = self.db.connection()?;
        let hash = conn
            .query_row(
                "SELECT commit_hash FROM processed_commits
                 WHERE status = 'success'
                 ORDER BY processed_at DESC, rowid DESC LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Commits a previous run left unfinished, oldest first.
    pub fn resumable_commits(&self) -> Result<Vec<String>> {
        self.commits_with_status(&[CommitStatus::Pending, CommitStatus::InProgress])
    }

    pub fn failed_commits(&self) -> Result<Vec<String>> {
        self.commits_with_status(&[CommitStatus::Failed])
    }

    /// Failed or interrupted commits, oldest first.
    pub fn retryable_commits(&self) -> Result<Vec<String>> {
        self.commits_with_status(&[CommitStatus::Failed, CommitStatus::InProgress])
    }

    fn commits_with_status(&self, statuses: &[CommitStatus]) -> Result<Vec<String>> {
        let placeholders = (1..=statuses.len())
            .map(|i| format!("?{}", i))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT commit_hash FROM processed_commits
             WHERE status IN ({})
             ORDER BY processed_at ASC, rowid ASC",
            placeholders
        );

        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(&sql)?;
        let hashes = stmt
            .query_map(
                rusqlite::params_from_iter(statuses.iter().map(|s| s.as_str())),
                |row| row.get(0),
            )?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(hashes)
    }

    /// Documentation commit linked to a code commit, if any.
    pub fn doc_commit_hash(&self, commit: &str) -> Result<Option<String>> {
        let conn = self.db.connection()?;
        let hash: Option<Option<String>> = conn
            .query_row(
                "SELECT doc_commit_hash FROM processed_commits WHERE commit_hash = ?1",
                params![commit],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash.flatten().filter(|h| !h.is_empty()))
    }

    /// Most recent rows first; a zero limit means the default.
    pub fn list_recent(&self, limit: usize) -> Result<Vec<ProcessedCommit>> {
        let limit = if limit == 0 { DEFAULT_LIST_LIMIT } else { limit };
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            "SELECT commit_hash, processed_at, status, error, doc_commit_hash, doc_files_changed, metadata
             FROM processed_commits
             ORDER BY processed_at DESC, rowid DESC
             LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], Self::map_commit_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn status_counts(&self) -> Result<StatusCounts> {
        let conn = self.db.connection()?;
        let mut stmt =
            conn.prepare("SELECT status, COUNT(*) FROM processed_commits GROUP BY status")?;
        let mut counts = StatusCounts::default();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for (status, count) in rows.filter_map(|r| log_filter_warn(r, "Skipping status row")) {
            counts.add(CommitStatus::parse_or_default(&status), count.max(0) as u64);
        }
        Ok(counts)
    }

    fn map_commit_row(row: &Row<'_>) -> rusqlite::Result<ProcessedCommit> {
        let status: String = row.get(2)?;
        let files: Option<String> = row.get(5)?;
        let doc_files_changed = files
            .and_then(|raw| {
                log_filter_warn(
                    serde_json::from_str::<Vec<String>>(&raw),
                    "Invalid doc_files_changed JSON",
                )
            })
            .unwrap_or_default();

        Ok(ProcessedCommit {
            commit_hash: row.get(0)?,
            processed_at: row.get(1)?,
            status: CommitStatus::parse_or_default(&status),
            error: row.get(3)?,
            doc_commit_hash: row.get(4)?,
            doc_files_changed,
            metadata: row.get(6)?,
        })
    }

    // =========================================================================
    // Code → doc mappings
    // =========================================================================

    pub fn store_mapping(&self, commit: &str, doc_file: &str, section: &str) -> Result<()> {
        self.db.connection()?.execute(
            "INSERT INTO mappings (code_commit_hash, doc_file, section, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![commit, doc_file, section, now_timestamp()],
        )?;
        Ok(())
    }

    pub fn mappings_for_commit(&self, commit: &str) -> Result<Vec<DocMapping>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            "SELECT code_commit_hash, doc_file, section FROM mappings
             WHERE code_commit_hash = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![commit], |row| {
                Ok(DocMapping {
                    code_commit_hash: row.get(0)?,
                    doc_file: row.get(1)?,
                    section: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // =========================================================================
    // Planned updates
    // =========================================================================

    /// Insert or refresh the plan row for (commit, doc file, section).
    pub fn upsert_planned_update(
        &self,
        commit: &str,
        doc_file: &str,
        section: &str,
        strategy: PlanStrategy,
        status: PlanStatus,
        reason: Option<&str>,
    ) -> Result<()> {
        let now = now_timestamp();
        self.db
            .connection()?
            .execute(
                r#"
                INSERT INTO planned_updates
                    (commit_hash, doc_file, section_id, strategy, status, reason, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
                ON CONFLICT(commit_hash, doc_file, section_id) DO UPDATE SET
                    strategy = excluded.strategy,
                    status = excluded.status,
                    reason = excluded.reason,
                    updated_at = excluded.updated_at
                "#,
                params![
                    commit,
                    doc_file,
                    section,
                    strategy.as_str(),
                    status.as_str(),
                    null_if_empty(reason),
                    now
                ],
            )
            .with_context_fn(|| format!("Failed to record planned update for {}", commit))?;
        Ok(())
    }

    pub fn planned_updates_for_commit(&self, commit: &str) -> Result<Vec<PlannedUpdate>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            "SELECT commit_hash, doc_file, section_id, strategy, status, reason, created_at, updated_at
             FROM planned_updates WHERE commit_hash = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![commit], |row| {
                let strategy: String = row.get(3)?;
                let status: String = row.get(4)?;
                Ok(PlannedUpdate {
                    commit_hash: row.get(0)?,
                    doc_file: row.get(1)?,
                    section_id: row.get(2)?,
                    strategy: PlanStrategy::parse_or_default(&strategy),
                    status: PlanStatus::parse_or_default(&status),
                    reason: row.get(5)?,
                    created_at: row.get(6)?,
                    updated_at: row.get(7)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // =========================================================================
    // Generation cache
    // =========================================================================

    /// Cached response for the exact six-field key; the prompt is fingerprinted here.
    pub fn cached_generation_response(
        &self,
        commit: &str,
        doc_file: &str,
        section: &str,
        provider: &str,
        model: &str,
        prompt: &str,
    ) -> Result<Option<String>> {
        let conn = self.db.connection()?;
        let response = conn
            .query_row(
                "SELECT response_text FROM llm_cache
                 WHERE commit_hash = ?1 AND doc_file = ?2 AND section_id = ?3
                   AND provider = ?4 AND model = ?5 AND prompt_hash = ?6",
                params![
                    commit,
                    doc_file,
                    section,
                    provider,
                    model,
                    prompt_fingerprint(prompt)
                ],
                |row| row.get(0),
            )
            .optional()?;
        Ok(response)
    }

    pub fn put_cached_generation_response(&self, entry: &GenerationCacheEntry) -> Result<()> {
        if entry.prompt_hash.trim().is_empty() {
            return Err(GitDocError::Storage(
                "prompt hash is required for llm cache entry".to_string(),
            ));
        }

        self.db
            .connection()?
            .execute(
                r#"
                INSERT INTO llm_cache
                    (commit_hash, doc_file, section_id, provider, model, prompt_hash, response_text, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(commit_hash, doc_file, section_id, provider, model, prompt_hash) DO UPDATE SET
                    response_text = excluded.response_text,
                    created_at = excluded.created_at
                "#,
                params![
                    entry.commit_hash,
                    entry.doc_file,
                    entry.section_id,
                    entry.provider,
                    entry.model,
                    entry.prompt_hash,
                    entry.response_text,
                    now_timestamp()
                ],
            )
            .with_context("Failed to store cached generation response")?;
        Ok(())
    }

    // =========================================================================
    // Run events
    // =========================================================================

    pub fn log_run_event(
        &self,
        run_id: &str,
        commit: Option<&str>,
        level: EventLevel,
        component: &str,
        message: &str,
        metadata: Option<&serde_json::Value>,
    ) -> Result<()> {
        let metadata = metadata.map(serde_json::to_string).transpose()?;
        self.db.connection()?.execute(
            "INSERT INTO run_events (run_id, commit_hash, level, component, message, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run_id,
                null_if_empty(commit),
                level.as_str(),
                component,
                message,
                metadata,
                now_timestamp()
            ],
        )?;
        Ok(())
    }

    /// Events of one run in creation order.
    pub fn run_events(&self, run_id: &str) -> Result<Vec<RunEvent>> {
        let conn = self.db.connection()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, commit_hash, level, component, message, metadata, created_at
             FROM run_events WHERE run_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map(params![run_id], |row| {
                let level: String = row.get(2)?;
                let metadata: Option<String> = row.get(5)?;
                Ok(RunEvent {
                    run_id: row.get(0)?,
                    commit_hash: row.get(1)?,
                    level: EventLevel::parse_or_default(&level),
                    component: row.get(3)?,
                    message: row.get(4)?,
                    metadata: metadata.and_then(|raw| {
                        log_filter_warn(serde_json::from_str(&raw), "Invalid run event metadata")
                    }),
                    created_at: row.get(6)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}
