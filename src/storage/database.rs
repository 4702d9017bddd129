//! Database Layer with Connection Pooling and Safe Transactions
//!
//! SQLite database layer featuring:
//! - Connection pooling via r2d2
//! - Panic-safe transactions with automatic rollback
//! - Detection-driven migrations for layouts written by older releases
//! - WAL mode for crash-safe writes

use std::path::Path;
use std::sync::Arc;

use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OptionalExtension};

use crate::types::{GitDocError, Result, ResultExt};

/// Shared database handle for async contexts.
pub type SharedDatabase = Arc<Database>;

const SCHEMA: &str = include_str!("schema.sql");

/// Current schema version, stored in `PRAGMA user_version`
const SCHEMA_VERSION: u32 = 2;

/// Maximum pooled connections for file databases
const POOL_SIZE: u32 = 4;

/// Timeout for acquiring a pooled connection (seconds)
const CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Migration definitions
///
/// A migration runs whenever `needed` reports the old layout, regardless of
/// the stored version, since databases written by earlier tools never set one.
struct Migration {
    version: u32,
    description: &'static str,
    needed: fn(&Connection) -> Result<bool>,
    up: fn(&Connection) -> Result<()>,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "Widen processed_commits status domain to include pending and in_progress",
    needed: legacy_status_domain,
    up: upgrade_status_domain,
}];

/// Columns of the current processed_commits layout, in declaration order.
const PROCESSED_COMMIT_COLUMNS: &[&str] = &[
    "commit_hash",
    "processed_at",
    "status",
    "error",
    "doc_commit_hash",
    "doc_files_changed",
    "metadata",
];

const PROCESSED_COMMITS_NEW: &str = r#"
    CREATE TABLE processed_commits_new (
        commit_hash TEXT PRIMARY KEY,
        processed_at TEXT NOT NULL DEFAULT '',
        status TEXT NOT NULL CHECK (status IN ('pending', 'in_progress', 'success', 'failed', 'skipped')),
        error TEXT,
        doc_commit_hash TEXT,
        doc_files_changed TEXT NOT NULL DEFAULT '[]',
        metadata TEXT
    );
"#;

/// Thread-safe database with connection pooling.
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl Database {
    /// Open database with connection pooling at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let manager =
            SqliteConnectionManager::file(path.as_ref()).with_init(Self::configure_connection);

        let pool = Pool::builder()
            .max_size(POOL_SIZE)
            .connection_timeout(std::time::Duration::from_secs(CONNECTION_TIMEOUT_SECS))
            .build(manager)
            .map_err(|e| {
                GitDocError::Storage(format!("Failed to create connection pool: {}", e))
            })?;

        Ok(Self { pool })
    }

    /// Open an in-memory database for testing or temporary use.
    pub fn open_in_memory() -> Result<Self> {
        let manager = SqliteConnectionManager::memory().with_init(|conn| {
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            Ok(())
        });

        // A second connection would see a different in-memory database.
        let pool = Pool::builder().max_size(1).build(manager).map_err(|e| {
            GitDocError::Storage(format!("Failed to create in-memory pool: {}", e))
        })?;

        Ok(Self { pool })
    }

    fn configure_connection(conn: &mut Connection) -> std::result::Result<(), rusqlite::Error> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.pool.get().map_err(|e| {
            GitDocError::Storage(format!("Failed to acquire database connection: {}", e))
        })
    }

    /// Bring the schema up to date.
    ///
    /// Legacy layouts are upgraded first so the indexes in the schema
    /// are created against the current table shape.
    pub fn initialize(&self) -> Result<()> {
        self.migrate()?;

        let conn = self.conn()?;
        conn.execute_batch(SCHEMA)
            .with_context("Failed to initialize database schema")?;
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)
            .with_context("Failed to set schema version")?;
        Ok(())
    }

    fn migrate(&self) -> Result<()> {
        for migration in MIGRATIONS {
            let needed = {
                let conn = self.conn()?;
                (migration.needed)(&conn)?
            };
            if !needed {
                continue;
            }

            self.transaction(|conn| (migration.up)(conn))
                .map_err(|e| {
                    GitDocError::Storage(format!(
                        "Failed to apply migration {}: {}: {}",
                        migration.version, migration.description, e
                    ))
                })?;

            tracing::info!(
                "Applied migration {}: {}",
                migration.version,
                migration.description
            );
        }
        Ok(())
    }

    /// Stored schema version.
    pub fn schema_version(&self) -> Result<u32> {
        let conn = self.conn()?;
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .with_context("Failed to read schema version")
    }

    /// Get a raw connection for advanced operations.
    pub fn connection(&self) -> Result<PooledConnection<SqliteConnectionManager>> {
        self.conn()
    }

    /// Execute a function within a panic-safe database transaction.
    ///
    /// All operations within the closure are atomic. If the closure errors or
    /// panics, the transaction is rolled back and the pool stays usable.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn()?;
        let tx = conn
            .transaction()
            .with_context("Failed to start transaction")?;

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| f(&tx)));

        match result {
            Ok(Ok(value)) => {
                tx.commit().with_context("Failed to commit transaction")?;
                Ok(value)
            }
            // Rolled back when `tx` drops.
            Ok(Err(e)) => Err(e),
            Err(panic_payload) => {
                let panic_msg = panic_payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic_payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "Unknown panic".to_string());

                tracing::error!("Transaction panicked: {}", panic_msg);
                Err(GitDocError::Storage(format!(
                    "Transaction panicked: {}",
                    panic_msg
                )))
            }
        }
    }
}

// =============================================================================
// Legacy status-domain upgrade
// =============================================================================

/// True when processed_commits exists but its CHECK lacks the newer states.
fn legacy_status_domain(conn: &Connection) -> Result<bool> {
    let table_sql: Option<Option<String>> = conn
        .query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = 'processed_commits'",
            [],
            |row| row.get(0),
        )
        .optional()?;

    Ok(match table_sql.flatten() {
        Some(sql) => !(sql.contains("'pending'") && sql.contains("'in_progress'")),
        None => false,
    })
}

/// Rebuild processed_commits with the five-state CHECK, copying every row.
///
/// Only columns present in both layouts are copied; the rest take their defaults.
fn upgrade_status_domain(conn: &Connection) -> Result<()> {
    let existing = table_columns(conn, "processed_commits")?;
    if !existing.iter().any(|c| c == "commit_hash") {
        return Err(GitDocError::Storage(
            "legacy processed_commits has no commit_hash column".to_string(),
        ));
    }

    let shared: Vec<&str> = PROCESSED_COMMIT_COLUMNS
        .iter()
        .copied()
        .filter(|column| existing.iter().any(|c| c == column))
        .collect();
    let column_list = shared.join(", ");

    // NULLs from the legacy layout would violate the new NOT NULL columns.
    let select_list = shared
        .iter()
        .map(|column| match *column {
            "processed_at" => "COALESCE(processed_at, '')".to_string(),
            "status" => "COALESCE(status, 'pending')".to_string(),
            "doc_files_changed" => "COALESCE(doc_files_changed, '[]')".to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ");

    conn.execute_batch(PROCESSED_COMMITS_NEW)?;
    conn.execute(
        &format!(
            "INSERT INTO processed_commits_new ({}) SELECT {} FROM processed_commits",
            column_list, select_list
        ),
        [],
    )?;
    conn.execute_batch(
        "DROP TABLE processed_commits;
         ALTER TABLE processed_commits_new RENAME TO processed_commits;",
    )?;
    Ok(())
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let columns = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(columns)
}
