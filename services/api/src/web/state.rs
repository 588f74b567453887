//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::{adapters::BroadcastNotifier, config::Config, error::ApiError};
use medication_tracker_core::{MedicationStore, SessionStore, StorageService};
use std::sync::Arc;
use tracing::info;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<MedicationStore>,
    pub session: Arc<SessionStore>,
    pub notifier: Arc<BroadcastNotifier>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Builds both stores over `storage` and loads them. The session is
    /// restored first so logs can be attributed from the first request on.
    pub async fn initialize(
        storage: Arc<dyn StorageService>,
        config: Arc<Config>,
    ) -> Result<Self, ApiError> {
        let notifier = Arc::new(BroadcastNotifier::new());

        let session = Arc::new(SessionStore::new(
            storage.clone(),
            notifier.clone(),
            config.auth_latency,
        ));
        session.initialize().await?;

        let store = Arc::new(MedicationStore::new(
            storage,
            notifier.clone(),
            session.clone(),
        ));
        store.initialize().await?;
        info!("Stores initialized.");

        Ok(Self {
            store,
            session,
            notifier,
            config,
        })
    }

    /// The id new medications and logs are attributed to.
    pub async fn active_patient_id(&self) -> String {
        self.session
            .current_user()
            .await
            .map(|u| u.id)
            .unwrap_or_else(|| medication_tracker_core::DEFAULT_PATIENT_ID.to_string())
    }
}
