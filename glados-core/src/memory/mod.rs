//! Implementations of the shared `MemoryStore` handle.

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStore;
pub use sqlite::SqliteMemory;
