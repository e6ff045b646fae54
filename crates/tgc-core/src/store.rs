//! SQLite-backed directory store.
//!
//! The database file is shared with the management backend that owns the
//! category/channel tables. The schema is also created here if absent, so a
//! fresh deployment (or a test) starts from an empty directory instead of a
//! missing-table error; writes stay with the management backend.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use crate::directory::{DirectoryRow, DirectoryStore};
use crate::Result;

const SCHEMA: &str = "
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS channels (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  chat_id TEXT,
  username TEXT,
  created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
  id TEXT PRIMARY KEY,
  name TEXT NOT NULL,
  created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS category_channels (
  id TEXT PRIMARY KEY,
  category_id TEXT NOT NULL,
  channel_id TEXT NOT NULL,
  UNIQUE(category_id, channel_id),
  FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE CASCADE,
  FOREIGN KEY (channel_id) REFERENCES channels(id) ON DELETE CASCADE
);
";

pub struct SqliteDirectoryStore {
    conn: Mutex<Connection>,
}

impl SqliteDirectoryStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl DirectoryStore for SqliteDirectoryStore {
    async fn channel_rows(&self) -> Result<Vec<DirectoryRow>> {
        let conn = self.conn.lock().await;
        // Blank usernames count as unlinked, same as NULL: either would
        // render an empty channel line into the directory blob.
        let mut stmt = conn.prepare(
            "SELECT c.name AS category, ch.username AS channel
             FROM categories c
             JOIN category_channels cc ON cc.category_id = c.id
             JOIN channels ch ON ch.id = cc.channel_id
             WHERE ch.username IS NOT NULL AND ch.username != ''
             ORDER BY c.name, ch.username",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DirectoryRow {
                    category: row.get(0)?,
                    channel: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
