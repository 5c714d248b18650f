//! Key-Value Store Adapters
//!
//! - `MemoryStore`: process-local TTL map
//! - `FileStore`: JSON document on disk, used by the CLI

mod memory;
mod file;

pub use memory::{MemoryStore, StoreEntry};
pub use file::{FileStore, DEFAULT_STORE_FILE};
