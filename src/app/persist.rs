//! JSON blobs over a [`StoragePort`].
//!
//! Thresholds and statistics are stored as small JSON documents so the
//! state directory stays human-readable.

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::ports::{StorageError, StoragePort};

/// Namespace shared by all appliance state.
pub const STATE_NAMESPACE: &str = "drybox";
pub const THRESHOLDS_KEY: &str = "thresholds";
pub const STATISTICS_KEY: &str = "statistics";

/// Largest blob we ever read back.
const MAX_BLOB_SIZE: usize = 2048;

/// Read and decode `key`.  `Ok(None)` when nothing has been stored yet.
pub fn load_json<T: DeserializeOwned>(
    storage: &impl StoragePort,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let mut buf = [0u8; MAX_BLOB_SIZE];
    let len = match storage.read(STATE_NAMESPACE, key, &mut buf) {
        Ok(len) => len,
        Err(StorageError::NotFound) => return Ok(None),
        Err(e) => return Err(e),
    };
    serde_json::from_slice(&buf[..len])
        .map(Some)
        .map_err(|_| StorageError::Corrupted)
}

/// Encode and durably write `value` under `key`.
pub fn store_json<T: Serialize>(
    storage: &mut impl StoragePort,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec(value).map_err(|_| StorageError::Corrupted)?;
    if bytes.len() > MAX_BLOB_SIZE {
        return Err(StorageError::Full);
    }
    storage.write(STATE_NAMESPACE, key, &bytes)
}
