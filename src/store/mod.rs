pub mod kv;
pub mod schema;
pub mod write_coalescer;

pub use kv::{JsonFileStore, KeyValueStore, MemoryStore, StoreError};
pub use schema::UserStats;
