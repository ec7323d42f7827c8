//! Persisted learner state: one JSON document under a fixed key.

use std::sync::Arc;

use exam_core::model::AppState;

use crate::repository::{KeyValueStore, Storage, StorageError};

/// Key the serialized [`AppState`] lives under.
pub const STATE_KEY: &str = "exam-study-data";

/// Serialize the state document.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if the state cannot be encoded.
pub fn encode_state(state: &AppState) -> Result<String, StorageError> {
    serde_json::to_string(state).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Parse a stored document.
///
/// # Errors
///
/// Returns `StorageError::Serialization` if `raw` is not a valid state document.
pub fn decode_state(raw: &str) -> Result<AppState, StorageError> {
    serde_json::from_str(raw).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Loads and saves the whole [`AppState`] through a [`KeyValueStore`].
///
/// Failures never reach the caller: loads fall back to the initial state and
/// saves are dropped, both with a log line.
#[derive(Clone)]
pub struct StateRepository {
    kv: Arc<dyn KeyValueStore>,
}

impl StateRepository {
    #[must_use]
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    #[must_use]
    pub fn from_storage(storage: &Storage) -> Self {
        Self::new(Arc::clone(&storage.kv))
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_storage(&Storage::in_memory())
    }

    /// Read the stored state, or the initial state when it is missing or unreadable.
    pub async fn load(&self) -> AppState {
        match self.try_load().await {
            Ok(Some(state)) => state,
            Ok(None) => {
                tracing::debug!(key = STATE_KEY, "no stored state, starting fresh");
                AppState::new()
            }
            Err(err) => {
                tracing::warn!(key = STATE_KEY, error = %err, "discarding unreadable stored state");
                AppState::new()
            }
        }
    }

    /// Like [`load`](Self::load) but surfaces the failure.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be read or the document is malformed.
    pub async fn try_load(&self) -> Result<Option<AppState>, StorageError> {
        let Some(raw) = self.kv.get(STATE_KEY).await? else {
            return Ok(None);
        };
        decode_state(&raw).map(Some)
    }

    /// Overwrite the stored document. Failures are logged and swallowed.
    pub async fn save(&self, state: &AppState) {
        if let Err(err) = self.try_save(state).await {
            tracing::error!(key = STATE_KEY, error = %err, "failed to persist state");
        }
    }

    /// Like [`save`](Self::save) but surfaces the failure.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if encoding or writing fails.
    pub async fn try_save(&self, state: &AppState) -> Result<(), StorageError> {
        let raw = encode_state(state)?;
        self.kv.put(STATE_KEY, &raw).await
    }

    /// Remove the stored document entirely.
    pub async fn clear(&self) {
        if let Err(err) = self.kv.remove(STATE_KEY).await {
            tracing::error!(key = STATE_KEY, error = %err, "failed to clear stored state");
        }
    }
}
