// glados-core/src/memory/sqlite.rs
//
// Writes are staged in memory and only reach the table on `flush`, inside a
// single transaction. Reads see staged values first.

use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use sqlx::Row;
use tokio::sync::Mutex;
use tracing::{debug, info};

use glados_common::traits::MemoryStore;

use crate::db::Database;
use crate::Error;

type RecordKey = (String, String);

pub struct SqliteMemory {
    db: Database,
    /// `None` marks a staged delete.
    staged: Mutex<BTreeMap<RecordKey, Option<Value>>>,
}

impl SqliteMemory {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            staged: Mutex::new(BTreeMap::new()),
        }
    }

    /// Connects, migrates and wraps in one step.
    pub async fn open(database_url: &str) -> Result<Self, Error> {
        let db = Database::new(database_url).await?;
        db.migrate().await?;
        Ok(Self::new(db))
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn staged_len(&self) -> usize {
        self.staged.lock().await.len()
    }

    async fn load(&self, namespace: &str, key: &str) -> Result<Option<Value>, Error> {
        let row = sqlx::query("SELECT value FROM memory_records WHERE namespace = ? AND key = ?")
            .bind(namespace)
            .bind(key)
            .fetch_optional(self.db.pool())
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.try_get("value")?;
                Ok(Some(serde_json::from_str(&raw)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl MemoryStore for SqliteMemory {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, Error> {
        let staged = self.staged.lock().await;
        if let Some(pending) = staged.get(&(namespace.to_string(), key.to_string())) {
            return Ok(pending.clone());
        }
        // Keep holding the lock so a concurrent flush can't slip in between.
        let loaded = self.load(namespace, key).await;
        drop(staged);
        loaded
    }

    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<(), Error> {
        let mut staged = self.staged.lock().await;
        staged.insert((namespace.to_string(), key.to_string()), Some(value));
        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<(), Error> {
        let mut staged = self.staged.lock().await;
        staged.insert((namespace.to_string(), key.to_string()), None);
        Ok(())
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<String>, Error> {
        let staged = self.staged.lock().await;
        let rows = sqlx::query("SELECT key FROM memory_records WHERE namespace = ?")
            .bind(namespace)
            .fetch_all(self.db.pool())
            .await?;

        let mut keys = BTreeSet::new();
        for row in rows {
            let key: String = row.try_get("key")?;
            keys.insert(key);
        }
        for ((ns, key), pending) in staged.iter() {
            if ns != namespace {
                continue;
            }
            match pending {
                Some(_) => keys.insert(key.clone()),
                None => keys.remove(key),
            };
        }
        Ok(keys.into_iter().collect())
    }

    async fn flush(&self) -> Result<(), Error> {
        let mut staged = self.staged.lock().await;
        if staged.is_empty() {
            debug!("Memory flush: nothing staged");
            return Ok(());
        }

        let now = Utc::now();
        let mut tx = self.db.pool().begin().await?;
        for ((namespace, key), pending) in staged.iter() {
            match pending {
                Some(value) => {
                    sqlx::query(
                        r#"INSERT INTO memory_records (namespace, key, value, updated_at)
                           VALUES (?, ?, ?, ?)
                           ON CONFLICT(namespace, key)
                           DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
                    )
                    .bind(namespace)
                    .bind(key)
                    .bind(serde_json::to_string(value)?)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query("DELETE FROM memory_records WHERE namespace = ? AND key = ?")
                        .bind(namespace)
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }
        tx.commit().await?;

        info!("Memory flush committed {} record(s)", staged.len());
        staged.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    async fn file_memory(dir: &tempfile::TempDir) -> (String, SqliteMemory) {
        let url = format!("sqlite://{}", dir.path().join("memory.db").display());
        let memory = SqliteMemory::open(&url).await.unwrap();
        (url, memory)
    }

    #[tokio::test]
    async fn test_staged_writes_visible_before_flush() {
        let memory = SqliteMemory::open("sqlite::memory:").await.unwrap();
        memory.put("greeter", "U1", json!({"count": 1})).await.unwrap();

        assert_eq!(
            memory.get("greeter", "U1").await.unwrap(),
            Some(json!({"count": 1}))
        );
        assert_eq!(memory.keys("greeter").await.unwrap(), vec!["U1".to_string()]);
        assert!(memory.keys("other").await.unwrap().is_empty());
        assert_eq!(memory.staged_len().await, 1);
    }

    #[tokio::test]
    async fn test_flush_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let (url, memory) = file_memory(&dir).await;

        memory.put("greeter", "U1", json!(3)).await.unwrap();
        memory.put("greeter", "U2", json!(5)).await.unwrap();

        // A second handle only sees what was committed.
        let other = SqliteMemory::open(&url).await.unwrap();
        assert_eq!(other.get("greeter", "U1").await.unwrap(), None);

        memory.flush().await.unwrap();
        assert_eq!(memory.staged_len().await, 0);
        assert_eq!(other.get("greeter", "U1").await.unwrap(), Some(json!(3)));
        assert_eq!(
            other.keys("greeter").await.unwrap(),
            vec!["U1".to_string(), "U2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_remove_is_staged_until_flush() {
        let dir = tempfile::tempdir().unwrap();
        let (url, memory) = file_memory(&dir).await;

        memory.put("ns", "k", json!("v")).await.unwrap();
        memory.flush().await.unwrap();

        memory.remove("ns", "k").await.unwrap();
        assert_eq!(memory.get("ns", "k").await.unwrap(), None);
        assert!(memory.keys("ns").await.unwrap().is_empty());

        let other = SqliteMemory::open(&url).await.unwrap();
        assert_eq!(other.get("ns", "k").await.unwrap(), Some(json!("v")));

        memory.flush().await.unwrap();
        assert_eq!(other.get("ns", "k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_flush_overwrites_existing_rows() {
        let memory = SqliteMemory::open("sqlite::memory:").await.unwrap();
        memory.put("ns", "k", json!(1)).await.unwrap();
        memory.flush().await.unwrap();
        memory.put("ns", "k", json!(2)).await.unwrap();
        memory.flush().await.unwrap();

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM memory_records")
            .fetch_one(memory.database().pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(memory.get("ns", "k").await.unwrap(), Some(json!(2)));
    }
}
