use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Thread-safe SQLite log of user requests.
#[derive(Clone)]
pub struct MessageStore {
    conn: Arc<Mutex<Connection>>,
}

impl MessageStore {
    /// Open or create the database at the given path and ensure the schema
    /// exists. A failure here means the process cannot continue.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        // Enable WAL mode for better concurrent read performance
        // journal_mode PRAGMA always returns the resulting mode, so use query_row
        let _: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;

        Self::run_migrations(&conn)?;

        info!("Message store initialized at: {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::run_migrations(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn run_migrations(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER NOT NULL,
                message TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            -- At most one row per exact (user_id, message) pair; inserts
            -- lean on this index to suppress duplicates atomically.
            CREATE UNIQUE INDEX IF NOT EXISTS idx_users_user_message
                ON users(user_id, message);
            ",
        )
        .context("Failed to create schema")?;

        Ok(())
    }

    /// Record one user request. Returns `Ok(false)` without writing when the
    /// identical `(user_id, text)` pair is already logged or `text` is empty.
    pub async fn record_message(&self, user_id: i64, text: &str) -> Result<bool> {
        if text.is_empty() {
            return Ok(false);
        }

        let conn = self.conn.lock().await;
        let inserted = conn
            .execute(
                "INSERT OR IGNORE INTO users (user_id, message) VALUES (?1, ?2)",
                rusqlite::params![user_id, text],
            )
            .context("Failed to record message")?;

        Ok(inserted > 0)
    }

    /// Number of distinct users seen so far. Degrades to 0 on a storage
    /// failure; the health endpoint must keep answering regardless.
    pub async fn count_distinct_users(&self) -> u64 {
        let conn = self.conn.lock().await;
        match conn.query_row("SELECT COUNT(DISTINCT user_id) FROM users", [], |row| {
            row.get::<_, i64>(0)
        }) {
            Ok(count) => count as u64,
            Err(e) => {
                warn!("Failed to count distinct users: {}", e);
                0
            }
        }
    }
}
