use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use glados_common::traits::MemoryStore;

use crate::Error;

type RecordKey = (String, String);

#[derive(Default)]
struct State {
    committed: BTreeMap<RecordKey, Value>,
    staged: BTreeMap<RecordKey, Option<Value>>,
    flushes: usize,
}

/// Process-local memory with the same staging semantics as `SqliteMemory`.
/// Nothing survives the process; useful for tests and dry runs.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `flush` has run.
    pub async fn flush_count(&self) -> usize {
        self.state.lock().await.flushes
    }

    /// The committed value, ignoring anything staged.
    pub async fn committed(&self, namespace: &str, key: &str) -> Option<Value> {
        let state = self.state.lock().await;
        state
            .committed
            .get(&(namespace.to_string(), key.to_string()))
            .cloned()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, Error> {
        let state = self.state.lock().await;
        let id = (namespace.to_string(), key.to_string());
        if let Some(pending) = state.staged.get(&id) {
            return Ok(pending.clone());
        }
        Ok(state.committed.get(&id).cloned())
    }

    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state
            .staged
            .insert((namespace.to_string(), key.to_string()), Some(value));
        Ok(())
    }

    async fn remove(&self, namespace: &str, key: &str) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        state.staged.insert((namespace.to_string(), key.to_string()), None);
        Ok(())
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<String>, Error> {
        let state = self.state.lock().await;
        let mut keys: BTreeSet<String> = state
            .committed
            .keys()
            .filter(|(ns, _)| ns == namespace)
            .map(|(_, k)| k.clone())
            .collect();
        for ((ns, key), pending) in state.staged.iter() {
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
        let mut state = self.state.lock().await;
        let staged = std::mem::take(&mut state.staged);
        for (id, pending) in staged {
            match pending {
                Some(value) => {
                    state.committed.insert(id, value);
                }
                None => {
                    state.committed.remove(&id);
                }
            }
        }
        state.flushes += 1;
        Ok(())
    }
}
