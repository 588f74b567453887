//! services/api/src/web/protocol.rs
//!
//! Defines the event-stream protocol between the API server and the browser
//! client. The stream is one-way: the server pushes, the client renders.

use medication_tracker_core::{Notification, StoreSnapshot};
use serde::Serialize;

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The full current state. Sent on connect and after every committed
    /// mutation; the client replaces whatever it rendered before.
    Snapshot { state: StoreSnapshot },

    /// A toast to display.
    Notification { notification: Notification },
}
