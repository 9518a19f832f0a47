use async_trait::async_trait;
use serde_json::Value;

use crate::error::Error;

/// The bot's shared long-term memory.
///
/// Records are JSON values addressed by `(namespace, key)`; plugins normally
/// use their own name as the namespace. Implementations serialize access
/// internally, so one handle can be shared between the inbound loop and
/// async dispatches. Writes may be staged until `flush`.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    async fn get(&self, namespace: &str, key: &str) -> Result<Option<Value>, Error>;

    async fn put(&self, namespace: &str, key: &str, value: Value) -> Result<(), Error>;

    async fn remove(&self, namespace: &str, key: &str) -> Result<(), Error>;

    /// Keys currently visible in `namespace`, staged writes included, sorted.
    async fn keys(&self, namespace: &str) -> Result<Vec<String>, Error>;

    /// Commits staged writes.
    async fn flush(&self) -> Result<(), Error>;
}
