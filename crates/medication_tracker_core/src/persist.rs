//! JSON snapshot helpers over the storage port.

use serde::{de::DeserializeOwned, Serialize};

use crate::ports::{PortError, PortResult, StorageService};

/// Storage key of the session user.
pub const USER_KEY: &str = "medication_app_user";
/// Storage key of the medications collection.
pub const MEDICATIONS_KEY: &str = "medications";
/// Storage key of the logs collection.
pub const LOGS_KEY: &str = "medication_logs";

/// Reads and parses the value under `key`. An absent key is `Ok(None)`; a
/// value that does not parse is a `Serialization` error.
pub async fn read_json<T: DeserializeOwned>(
    storage: &dyn StorageService,
    key: &str,
) -> PortResult<Option<T>> {
    match storage.get(key).await? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PortError::Serialization {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        None => Ok(None),
    }
}

/// Serializes `value` and writes the whole snapshot under `key`.
pub async fn write_json<T: Serialize + ?Sized>(
    storage: &dyn StorageService,
    key: &str,
    value: &T,
) -> PortResult<()> {
    let raw = serde_json::to_string(value).map_err(|e| PortError::Serialization {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    storage.set(key, &raw).await
}
