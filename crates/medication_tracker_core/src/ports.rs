//! crates/medication_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) the stores depend on.
//! These traits form the boundary of the hexagonal architecture, keeping the
//! core independent of the concrete storage engine and of how toasts reach
//! the user.

use async_trait::async_trait;
use serde::Serialize;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Storage failure: {0}")]
    Storage(String),
    #[error("Malformed stored value under '{key}': {reason}")]
    Serialization { key: String, reason: String },
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Store not initialized")]
    NotReady,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Durable local key-value storage. Values are whole serialized snapshots.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> PortResult<()>;

    /// Removes the key. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A user-visible toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: "Success".to_string(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: "Error".to_string(),
            description: description.into(),
        }
    }
}

/// Receives toasts. Delivery is fire-and-forget.
pub trait NotificationService: Send + Sync {
    fn notify(&self, notification: Notification);
}
