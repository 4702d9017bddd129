use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use proptest::prelude::*;
use tokio_util::sync::CancellationToken;

use super::*;
use crate::ai::{LlmProvider, MockProvider};
use crate::config::MappingRule;
use crate::doc::MarkdownUpdater;
use crate::git::{CommitInfo, CommitSource};
use crate::types::{
    EventLevel, GitDocError, PlanStatus, PlanStrategy, Result, ValidationErrorKind,
};

const README: &str = "# Title\n\n## Recent Changes\nold\n";
const DIFF: &str = "diff --git a/src/a.txt b/src/a.txt\n--- a/src/a.txt\n+++ b/src/a.txt\n@@ -1,0 +1,1 @@\n+hello\n";

// =============================================================================
// Test doubles
// =============================================================================

#[derive(Default)]
struct FakeState {
    head: String,
    history: Vec<String>,
    changed: HashMap<String, Vec<String>>,
    messages: HashMap<String, String>,
    ranges: Vec<(String, String)>,
    diff_requests: Vec<String>,
    commit_messages: Vec<String>,
    amends: usize,
    reject_commits: bool,
}

struct FakeCommitSource {
    dir: tempfile::TempDir,
    state: Mutex<FakeState>,
}

impl FakeCommitSource {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("README.md"), README).unwrap();
        Self {
            dir,
            state: Mutex::new(FakeState {
                head: "head-1".to_string(),
                ..Default::default()
            }),
        }
    }

    /// Append a commit to history, making it HEAD.
    fn add_commit(&self, hash: &str, files: &[&str], message: &str) {
        let mut state = self.state.lock().unwrap();
        state.history.push(hash.to_string());
        state.head = hash.to_string();
        self.set_commit(&mut state, hash, files, message);
    }

    /// Known commit outside the listed history
    fn add_detached(&self, hash: &str, files: &[&str], message: &str) {
        let mut state = self.state.lock().unwrap();
        self.set_commit(&mut state, hash, files, message);
    }

    fn set_commit(&self, state: &mut FakeState, hash: &str, files: &[&str], message: &str) {
        state
            .changed
            .insert(hash.to_string(), files.iter().map(|f| f.to_string()).collect());
        state.messages.insert(hash.to_string(), message.to_string());
    }

    fn path(&self, rel: &str) -> std::path::PathBuf {
        self.dir.path().join(rel)
    }

    fn readme(&self) -> String {
        fs::read_to_string(self.path("README.md")).unwrap()
    }

    fn stage_calls(&self) -> usize {
        self.state.lock().unwrap().commit_messages.len()
    }

    fn amend_calls(&self) -> usize {
        self.state.lock().unwrap().amends
    }

    /// Make every later stage-and-commit or amend fail.
    fn reject_commits(&self) {
        self.state.lock().unwrap().reject_commits = true;
    }
}

fn index_locked() -> GitDocError {
    GitDocError::Git {
        command: "commit".to_string(),
        message: "index.lock exists".to_string(),
    }
}

#[async_trait]
impl CommitSource for FakeCommitSource {
    fn repo_root(&self) -> &Path {
        self.dir.path()
    }

    async fn current_head(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().head.clone())
    }

    async fn commit_range(&self, from: &str, to: &str) -> Result<Vec<CommitInfo>> {
        let mut state = self.state.lock().unwrap();
        state.ranges.push((from.to_string(), to.to_string()));

        let Some(end) = state.history.iter().position(|h| h == to) else {
            return Ok(Vec::new());
        };
        let start = state
            .history
            .iter()
            .position(|h| h == from)
            .map_or(0, |i| i + 1);

        Ok(state.history[start.min(end + 1)..=end]
            .iter()
            .map(|hash| CommitInfo {
                hash: hash.clone(),
                author: "Dev".to_string(),
                email: "dev@example.com".to_string(),
                timestamp: Utc::now(),
                subject: state.messages.get(hash).cloned().unwrap_or_default(),
            })
            .collect())
    }

    async fn diff(&self, commit: &str) -> Result<String> {
        self.state.lock().unwrap().diff_requests.push(commit.to_string());
        Ok(DIFF.to_string())
    }

    async fn message(&self, commit: &str) -> Result<String> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .messages
            .get(commit)
            .cloned()
            .unwrap_or_default())
    }

    async fn changed_files(&self, commit: &str) -> Result<Vec<String>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .changed
            .get(commit)
            .cloned()
            .unwrap_or_default())
    }

    async fn stage_and_commit(&self, _paths: &[String], message: &str) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.reject_commits {
            return Err(index_locked());
        }
        state.commit_messages.push(message.to_string());
        Ok(format!("doc-{}", state.commit_messages.len()))
    }

    async fn stage_and_amend(&self, _paths: &[String]) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        if state.reject_commits {
            return Err(index_locked());
        }
        state.amends += 1;
        Ok(format!("amended-{}", state.amends))
    }

    async fn revert(&self, _commit: &str) -> Result<()> {
        Ok(())
    }
}

/// Mock output unless a fixed reply is set; counts calls.
#[derive(Default)]
struct CountingProvider {
    reply: Option<String>,
    calls: AtomicUsize,
}

impl CountingProvider {
    fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Some(reply.into()),
            calls: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for CountingProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, cancel: &CancellationToken, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            Some(reply) => Ok(reply.clone()),
            None => MockProvider::new().generate(cancel, prompt).await,
        }
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.doc_files = vec!["README.md".to_string()];
    config.git.commit_doc_updates = false;
    config
}

struct Harness {
    source: Arc<FakeCommitSource>,
    provider: Arc<CountingProvider>,
    store: StateStore,
    updater: Updater,
}

fn harness_with(config: Config, provider: CountingProvider) -> Harness {
    let source = Arc::new(FakeCommitSource::new());
    let provider = Arc::new(provider);
    let store = StateStore::open_in_memory().unwrap();

    let commit_source: SharedCommitSource = source.clone();
    let client: SharedProvider = provider.clone();
    let updater = Updater::new(UpdaterDeps {
        config: Arc::new(config),
        store: store.clone(),
        commit_source,
        client,
        doc_updater: Arc::new(MarkdownUpdater::new()),
    });

    Harness {
        source,
        provider,
        store,
        updater,
    }
}

fn harness() -> Harness {
    harness_with(test_config(), CountingProvider::default())
}

fn status_of(store: &StateStore, hash: &str) -> CommitStatus {
    store.get_commit(hash).unwrap().unwrap().status
}

fn hashes(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

// =============================================================================
// Update operations
// =============================================================================

#[tokio::test]
async fn test_single_commit_end_to_end() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "feat: add thing");

    let summary = h
        .updater
        .update_new_commits(&CancellationToken::new(), false)
        .await
        .unwrap();

    assert_eq!(
        summary,
        Summary {
            processed: 1,
            success: 1,
            failed: 0,
            skipped: 0
        }
    );
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(status_of(&h.store, "c1"), CommitStatus::Success);

    let readme = h.source.readme();
    assert!(readme.starts_with("# Title\n\n## Recent Changes\n- Auto-generated update\n"));
    assert!(!readme.contains("\nold\n"));

    let plans = h.store.planned_updates_for_commit("c1").unwrap();
    assert_eq!(plans.len(), 1);
    assert_eq!(plans[0].doc_file, "README.md");
    assert_eq!(plans[0].section_id, "Recent Changes");
    assert_eq!(plans[0].strategy, PlanStrategy::Inferred);
    assert_eq!(plans[0].status, PlanStatus::Applied);

    let mappings = h.store.mappings_for_commit("c1").unwrap();
    assert_eq!(mappings.len(), 1);
    assert_eq!(mappings[0].section, "Recent Changes");

    let row = h.store.get_commit("c1").unwrap().unwrap();
    assert_eq!(row.doc_files_changed, vec!["README.md"]);
    assert_eq!(row.doc_commit_hash, None);
    assert_eq!(h.source.stage_calls(), 0);
}

#[tokio::test]
async fn test_rerun_finds_nothing_new() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "feat: add thing");
    let cancel = CancellationToken::new();

    h.updater.update_new_commits(&cancel, false).await.unwrap();
    let again = h.updater.update_new_commits(&cancel, false).await.unwrap();

    assert_eq!(again, Summary::default());
    assert_eq!(h.provider.calls(), 1);
    let ranges = h.source.state.lock().unwrap().ranges.clone();
    assert_eq!(ranges[1], ("c1".to_string(), "c1".to_string()));
}

#[tokio::test]
async fn test_reprocesses_pending_and_in_progress() {
    let h = harness();
    h.source.add_detached("c-pending", &["src/a.txt"], "first change");
    h.source.add_detached("c-progress", &["src/b.txt"], "second change");
    h.store
        .mark_commit_processed("c-pending", CommitStatus::Pending, None, None, &[])
        .unwrap();
    h.store
        .mark_commit_processed("c-progress", CommitStatus::InProgress, None, None, &[])
        .unwrap();

    let summary = h
        .updater
        .update_new_commits(&CancellationToken::new(), false)
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.success, 2);
    assert_eq!(status_of(&h.store, "c-pending"), CommitStatus::Success);
    assert_eq!(status_of(&h.store, "c-progress"), CommitStatus::Success);
    assert!(h.store.resumable_commits().unwrap().is_empty());
}

#[tokio::test]
async fn test_resumable_and_range_are_deduplicated() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "feat: add thing");
    h.store
        .mark_commit_processed("c1", CommitStatus::Pending, None, None, &[])
        .unwrap();

    let summary = h
        .updater
        .update_new_commits(&CancellationToken::new(), false)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(h.source.state.lock().unwrap().diff_requests, vec!["c1"]);
}

#[tokio::test]
async fn test_range_passes_bounds() {
    let h = harness();
    let cancel = CancellationToken::new();

    let summary = h
        .updater
        .update_range_commits(&cancel, " from-1 ", "to-1", false)
        .await
        .unwrap();
    assert_eq!(summary, Summary::default());

    h.updater
        .update_range_commits(&cancel, "from-2", "  ", false)
        .await
        .unwrap();

    let ranges = h.source.state.lock().unwrap().ranges.clone();
    assert_eq!(
        ranges,
        vec![
            ("from-1".to_string(), "to-1".to_string()),
            ("from-2".to_string(), "head-1".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_range_processes_listed_commits() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "one");
    h.source.add_commit("c2", &["src/b.txt"], "two");
    h.source.add_commit("c3", &["src/c.txt"], "three");

    let summary = h
        .updater
        .update_range_commits(&CancellationToken::new(), "c1", "", false)
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(h.source.state.lock().unwrap().diff_requests, vec!["c2", "c3"]);
    assert!(h.store.get_commit("c1").unwrap().is_none());
}

#[tokio::test]
async fn test_amend_path_only() {
    let mut config = test_config();
    config.git.commit_doc_updates = true;
    config.git.amend_original = true;
    let h = harness_with(config, CountingProvider::default());
    h.source.add_commit("c1", &["src/a.txt"], "feat");

    h.updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), false)
        .await
        .unwrap();

    assert_eq!(h.source.amend_calls(), 1);
    assert_eq!(h.source.stage_calls(), 0);
    assert_eq!(
        h.store.doc_commit_hash("c1").unwrap().as_deref(),
        Some("amended-1")
    );
}

#[tokio::test]
async fn test_separate_commit_path_only() {
    let mut config = test_config();
    config.git.commit_doc_updates = true;
    let h = harness_with(config, CountingProvider::default());
    h.source.add_commit("c1", &["src/a.txt"], "feat");

    h.updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), false)
        .await
        .unwrap();

    assert_eq!(h.source.amend_calls(), 0);
    assert_eq!(
        h.source.state.lock().unwrap().commit_messages,
        vec!["docs: auto-update for c1"]
    );
    assert_eq!(h.store.doc_commit_hash("c1").unwrap().as_deref(), Some("doc-1"));
}

#[tokio::test]
async fn test_commit_failure_marks_commit_and_plan_failed() {
    for amend in [false, true] {
        let mut config = test_config();
        config.git.commit_doc_updates = true;
        config.git.amend_original = amend;
        let h = harness_with(config, CountingProvider::default());
        h.source.add_commit("c1", &["src/a.txt"], "feat");
        h.source.reject_commits();

        let summary = h
            .updater
            .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), false)
            .await
            .unwrap();
        assert_eq!(summary.processed, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.success, 0);

        let row = h.store.get_commit("c1").unwrap().unwrap();
        assert_eq!(row.status, CommitStatus::Failed);
        assert_eq!(row.error.as_deref(), Some("git commit failed: index.lock exists"));
        assert_eq!(row.doc_commit_hash, None);

        let plan = &h.store.planned_updates_for_commit("c1").unwrap()[0];
        assert_eq!(plan.status, PlanStatus::Failed);
        assert_eq!(plan.reason, row.error);
        assert!(h.store.mappings_for_commit("c1").unwrap().is_empty());
    }
}

#[tokio::test]
async fn test_cache_and_event_failures_do_not_abort() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "feat");
    h.store
        .database()
        .connection()
        .unwrap()
        .execute_batch("DROP TABLE llm_cache; DROP TABLE run_events;")
        .unwrap();

    let summary = h
        .updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), false)
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.success, 1);
    assert_eq!(summary.failed, 0);
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(status_of(&h.store, "c1"), CommitStatus::Success);
    assert_eq!(h.store.mappings_for_commit("c1").unwrap().len(), 1);
    let plan = &h.store.planned_updates_for_commit("c1").unwrap()[0];
    assert_eq!(plan.status, PlanStatus::Applied);
    assert!(h.source.readme().contains("## Recent Changes"));
}

#[tokio::test]
async fn test_commit_without_files_is_skipped() {
    let h = harness();
    h.source.add_commit("empty", &[], "merge");

    let summary = h
        .updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["empty"]), false)
        .await
        .unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(h.provider.calls(), 0);
    assert_eq!(status_of(&h.store, "empty"), CommitStatus::Skipped);
    assert_eq!(h.source.readme(), README);
}

#[tokio::test]
async fn test_missing_doc_file_fails_before_generation() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "feat");
    fs::remove_file(h.source.path("README.md")).unwrap();

    let summary = h
        .updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), false)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(h.provider.calls(), 0);
    let row = h.store.get_commit("c1").unwrap().unwrap();
    assert_eq!(row.status, CommitStatus::Failed);
    assert!(row.error.unwrap().contains("target doc file not found: README.md"));
    assert!(!h.source.path("README.md").exists());
}

#[tokio::test]
async fn test_dry_run_leaves_disk_and_git_alone() {
    let mut config = test_config();
    config.git.commit_doc_updates = true;
    let h = harness_with(config, CountingProvider::default());
    h.source.add_commit("c1", &["src/a.txt"], "feat");

    let summary = h
        .updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), true)
        .await
        .unwrap();

    assert_eq!(summary.success, 1);
    assert_eq!(h.source.readme(), README);
    assert_eq!(h.source.stage_calls(), 0);
    assert_eq!(h.source.amend_calls(), 0);

    let plan = &h.store.planned_updates_for_commit("c1").unwrap()[0];
    assert_eq!(plan.status, PlanStatus::Applied);
    assert_eq!(plan.reason.as_deref(), Some("dry-run"));
    assert!(h.store.mappings_for_commit("c1").unwrap().is_empty());
}

#[tokio::test]
async fn test_rerun_hits_cache_and_skips_unchanged() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "feat");
    let cancel = CancellationToken::new();
    let commits = hashes(&["c1"]);

    h.updater.update_commit_list(&cancel, &commits, false).await.unwrap();
    let after_first = h.source.readme();

    let summary = h.updater.update_commit_list(&cancel, &commits, false).await.unwrap();

    assert_eq!(summary.skipped, 1);
    assert_eq!(h.provider.calls(), 1);
    assert_eq!(h.source.readme(), after_first);

    let plan = &h.store.planned_updates_for_commit("c1").unwrap()[0];
    assert_eq!(plan.status, PlanStatus::Unchanged);
    assert_eq!(plan.reason.as_deref(), Some("no document delta"));
}

#[tokio::test]
async fn test_cancellation_fails_commit() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "feat");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = h
        .updater
        .update_commit_list(&cancel, &hashes(&["c1"]), false)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    let row = h.store.get_commit("c1").unwrap().unwrap();
    assert_eq!(row.error.as_deref(), Some("operation cancelled"));
    assert_eq!(h.source.readme(), README);

    let plan = &h.store.planned_updates_for_commit("c1").unwrap()[0];
    assert_eq!(plan.status, PlanStatus::Failed);
}

#[tokio::test]
async fn test_blank_generation_is_rejected() {
    let h = harness_with(test_config(), CountingProvider::replying(" \n\t "));
    h.source.add_commit("c1", &["src/a.txt"], "feat");

    let summary = h
        .updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), false)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(h.source.readme(), README);
    let row = h.store.get_commit("c1").unwrap().unwrap();
    assert!(row.error.unwrap().contains("generated section content is empty"));

    let plan = &h.store.planned_updates_for_commit("c1").unwrap()[0];
    assert_eq!(plan.status, PlanStatus::Failed);
    assert!(plan.reason.as_deref().unwrap().contains("is empty"));
}

#[tokio::test]
async fn test_oversized_generation_is_rejected() {
    let h = harness_with(test_config(), CountingProvider::replying("x".repeat(25_001)));
    h.source.add_commit("c1", &["src/a.txt"], "feat");

    let summary = h
        .updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), false)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(h.source.readme(), README);
    let row = h.store.get_commit("c1").unwrap().unwrap();
    assert!(row.error.unwrap().contains("exceeds max size"));
}

#[tokio::test]
async fn test_mapping_routes_to_section() {
    let mut config = test_config();
    config.mappings = vec![MappingRule::new("src/api/*", "docs/api.md", "Endpoints")];
    let h = harness_with(config, CountingProvider::replying("- GET /health"));
    fs::create_dir_all(h.source.path("docs")).unwrap();
    fs::write(h.source.path("docs/api.md"), "# API\r\n\r\nIntro\r\n").unwrap();
    h.source.add_commit("c1", &["README.txt", "src/api/handler.rs"], "feat(api)");

    let summary = h
        .updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["c1"]), false)
        .await
        .unwrap();

    assert_eq!(summary.success, 1);
    let doc = fs::read_to_string(h.source.path("docs/api.md")).unwrap();
    assert_eq!(doc, "# API\r\n\r\nIntro\r\n\r\n## Endpoints\r\n\r\n- GET /health\r\n");
    assert_eq!(h.source.readme(), README);
    assert_eq!(h.store.mappings_for_commit("c1").unwrap()[0].doc_file, "docs/api.md");
}

#[tokio::test]
async fn test_one_failure_does_not_stop_the_run() {
    let mut config = test_config();
    config.mappings = vec![MappingRule::new("missing/", "nope.md", "Notes")];
    let h = harness_with(config, CountingProvider::default());
    h.source.add_commit("bad", &["missing/x"], "bad");
    h.source.add_commit("good", &["src/a.txt"], "good");

    let summary = h
        .updater
        .update_commit_list(&CancellationToken::new(), &hashes(&["bad", "good"]), false)
        .await
        .unwrap();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.success, 1);
    assert_eq!(status_of(&h.store, "good"), CommitStatus::Success);
}

#[tokio::test]
async fn test_run_events_bracket_the_loop() {
    let h = harness();
    h.source.add_commit("c1", &["src/a.txt"], "feat");
    let cancel = CancellationToken::new();
    let commits = hashes(&["c1"]);

    h.updater.update_commit_list(&cancel, &commits, false).await.unwrap();
    h.updater.update_commit_list(&cancel, &commits, false).await.unwrap();

    let conn = h.store.database().connection().unwrap();
    let run_id: String = conn
        .query_row(
            "SELECT run_id FROM run_events WHERE message = 'cache hit'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    drop(conn);

    let events = h.store.run_events(&run_id).unwrap();
    let messages: Vec<&str> = events.iter().map(|e| e.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["update loop started", "cache hit", "update loop finished"]
    );
    assert_eq!(events[1].level, EventLevel::Info);
    assert_eq!(events[1].commit_hash.as_deref(), Some("c1"));
    assert_eq!(events[2].metadata.as_ref().unwrap()["skipped"], 1);
}

// =============================================================================
// Pure helpers
// =============================================================================

#[test]
fn test_resolve_target_fallbacks() {
    let mut config = test_config();
    let target = resolve_target(&config, &hashes(&["src/a.txt"]));
    assert_eq!(
        target,
        DocTarget {
            doc_file: "README.md".to_string(),
            section: "Recent Changes".to_string()
        }
    );

    config.doc_files.clear();
    config.runtime.default_section = "Changelog".to_string();
    let target = resolve_target(&config, &hashes(&["src/a.txt"]));
    assert_eq!(target.doc_file, "README.md");
    assert_eq!(target.section, "Changelog");
}

#[test]
fn test_resolve_target_first_file_then_first_mapping() {
    let mut config = test_config();
    config.mappings = vec![
        MappingRule::new("lib/", "docs/lib.md", "Lib"),
        MappingRule::new("*.go", "docs/go.md", "Go"),
        MappingRule::new("src/", "docs/src.md", "Src"),
    ];

    let target = resolve_target(&config, &hashes(&["src/main.go", "lib/x.rs"]));
    assert_eq!(target.doc_file, "docs/go.md");

    let target = resolve_target(&config, &hashes(&["src/main.rs"]));
    assert_eq!(target.doc_file, "docs/src.md");
}

#[test]
fn test_validate_generated_section() {
    assert!(validate_generated_section("ok").is_ok());
    assert!(validate_generated_section(&"é".repeat(25_000)).is_ok());

    match validate_generated_section("   ") {
        Err(GitDocError::Validation(e)) => assert_eq!(e.kind, ValidationErrorKind::Empty),
        other => panic!("unexpected: {:?}", other),
    }
    match validate_generated_section(&"a".repeat(25_001)) {
        Err(GitDocError::Validation(e)) => assert_eq!(e.kind, ValidationErrorKind::TooLarge),
        other => panic!("unexpected: {:?}", other),
    }
}

#[test]
fn test_merge_unique_order() {
    let merged = merge_unique(hashes(&["a", "", "b", "a"]), hashes(&["b", "c", " ", "a", "d"]));
    assert_eq!(merged, hashes(&["a", "b", "c", "d"]));
}

#[test]
fn test_summary_display() {
    let mut summary = Summary::default();
    summary.record(CommitStatus::Success);
    summary.record(CommitStatus::Failed);
    summary.record(CommitStatus::Skipped);
    summary.record(CommitStatus::InProgress);
    assert_eq!(
        summary.to_string(),
        "processed=4 success=1 failed=2 skipped=1"
    );
}

proptest! {
    #[test]
    fn prop_merge_unique_keeps_first_occurrences(
        first in proptest::collection::vec("[a-c ]{0,2}", 0..8),
        rest in proptest::collection::vec("[a-c ]{0,2}", 0..8),
    ) {
        let merged = merge_unique(first.clone(), rest.clone());

        let mut expected: Vec<String> = Vec::new();
        for hash in first.iter().chain(rest.iter()) {
            if !hash.trim().is_empty() && !expected.contains(hash) {
                expected.push(hash.clone());
            }
        }
        prop_assert_eq!(merged, expected);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_summary_counts_add_up(kinds in proptest::collection::vec(0u8..3, 0..8)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        let mut config = test_config();
        config.mappings = vec![MappingRule::new("missing/", "nope.md", "Notes")];
        let h = harness_with(config, CountingProvider::default());

        let mut commits = Vec::new();
        for (i, kind) in kinds.iter().enumerate() {
            let hash = format!("c{}", i);
            let files: &[&str] = match kind {
                0 => &[],
                1 => &["missing/x"],
                _ => &["src/a.txt"],
            };
            h.source.add_commit(&hash, files, &format!("change number {}", i));
            commits.push(hash);
        }

        let summary = runtime
            .block_on(h.updater.update_commit_list(&CancellationToken::new(), &commits, false))
            .unwrap();

        prop_assert_eq!(summary.processed, kinds.len());
        prop_assert_eq!(summary.processed, summary.success + summary.failed + summary.skipped);
        prop_assert_eq!(summary.skipped, kinds.iter().filter(|k| **k == 0).count());
        prop_assert_eq!(summary.failed, kinds.iter().filter(|k| **k == 1).count());
        prop_assert_eq!(summary.success, kinds.iter().filter(|k| **k == 2).count());
    }
}
