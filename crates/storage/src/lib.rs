#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;
pub mod state_repo;

pub use repository::{InMemoryStore, KeyValueStore, Storage, StorageError};
pub use state_repo::{STATE_KEY, StateRepository};
