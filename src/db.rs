use crate::error::{ImportError, Result};
use crate::storage::Storage;
use crate::types::PersistedAccount;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS documents (
        collection  TEXT NOT NULL,
        name        TEXT NOT NULL,
        username    TEXT,
        body        TEXT NOT NULL,
        PRIMARY KEY (collection, name)
    );
    CREATE INDEX IF NOT EXISTS documents_username ON documents (collection, username);
"#;

/// SQLite-backed document store. Each account is one JSON document row.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        info!("Opening document store at {}", path.display());
        let conn = Connection::open(path)?;
        conn.query_row("PRAGMA journal_mode=WAL", [], |_| Ok(()))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| ImportError::Storage {
            message: format!("sqlite connection poisoned: {e}"),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn delete_all(&self, collection: &str) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM documents WHERE collection = ?1",
            params![collection],
        )?;
        debug!("Deleted {} accounts from {}", removed, collection);
        Ok(removed as u64)
    }

    async fn insert_account(&self, collection: &str, account: &PersistedAccount) -> Result<()> {
        let body = serde_json::to_string(account)?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO documents (collection, name, username, body) VALUES (?1, ?2, ?3, ?4)",
            params![collection, account.name, account.username, body],
        )?;
        debug!("Inserted account: {} with id {}", account.name, account.id);
        Ok(())
    }

    async fn list_accounts(&self, collection: &str) -> Result<Vec<PersistedAccount>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT body FROM documents WHERE collection = ?1 ORDER BY name")?;
        let bodies = stmt
            .query_map(params![collection], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|body| serde_json::from_str(body).map_err(ImportError::from))
            .collect()
    }

    async fn find_account(
        &self,
        collection: &str,
        username: &str,
    ) -> Result<Option<PersistedAccount>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT body FROM documents WHERE collection = ?1 AND username = ?2 ORDER BY name LIMIT 1",
        )?;
        let mut rows = stmt.query(params![collection, username])?;
        let body: Option<String> = match rows.next()? {
            Some(row) => Some(row.get(0)?),
            None => None,
        };
        Ok(body.map(|b| serde_json::from_str(&b)).transpose()?)
    }
}
