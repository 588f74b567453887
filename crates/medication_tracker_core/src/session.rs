//! crates/medication_tracker_core/src/session.rs
//!
//! The session store: who is currently using the app.
//!
//! Login and registration are local simulations. Login resolves an email
//! against the built-in demo accounts and never checks the password. Both
//! wait a configurable delay to mimic a network round trip.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{Role, User};
use crate::persist::{read_json, write_json, USER_KEY};
use crate::ports::{Notification, NotificationService, PortError, StorageService};
use crate::seed::demo_users;

/// Default simulated round-trip for login and registration.
pub const DEFAULT_AUTH_LATENCY: Duration = Duration::from_secs(1);

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error(transparent)]
    Port(#[from] PortError),
}

#[derive(Debug)]
struct SessionState {
    user: Option<User>,
    loading: bool,
}

pub struct SessionStore {
    storage: Arc<dyn StorageService>,
    notifier: Arc<dyn NotificationService>,
    latency: Duration,
    state: RwLock<SessionState>,
}

impl SessionStore {
    pub fn new(
        storage: Arc<dyn StorageService>,
        notifier: Arc<dyn NotificationService>,
        latency: Duration,
    ) -> Self {
        Self {
            storage,
            notifier,
            latency,
            state: RwLock::new(SessionState {
                user: None,
                loading: true,
            }),
        }
    }

    /// Restores a previously persisted session user, if any.
    pub async fn initialize(&self) -> Result<(), SessionError> {
        let restored: Option<User> = read_json(self.storage.as_ref(), USER_KEY).await?;
        if let Some(user) = &restored {
            info!("Restored session for {}", user.email);
        }
        let mut state = self.state.write().await;
        state.user = restored;
        state.loading = false;
        Ok(())
    }

    pub async fn current_user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn loading(&self) -> bool {
        self.state.read().await.loading
    }

    /// Signs in as the demo account registered under `email`.
    pub async fn login(&self, email: &str, _password: &str) -> Result<User, SessionError> {
        let result = self
            .while_loading(async {
                tokio::time::sleep(self.latency).await;
                let user = demo_users()
                    .into_iter()
                    .find(|u| u.email == email)
                    .ok_or(SessionError::InvalidCredentials)?;
                self.commit(Some(user.clone())).await?;
                Ok(user)
            })
            .await;

        match result {
            Ok(user) => {
                info!("User {} logged in", user.email);
                self.notifier
                    .notify(Notification::success("Logged in successfully"));
                Ok(user)
            }
            Err(e) => {
                warn!("Login for {} failed: {}", email, e);
                self.notifier.notify(Notification::error("Invalid credentials"));
                Err(e)
            }
        }
    }

    /// Creates a new local account and signs in as it.
    pub async fn register(
        &self,
        email: &str,
        _password: &str,
        name: &str,
        role: Role,
    ) -> Result<User, SessionError> {
        let result = self
            .while_loading(async {
                tokio::time::sleep(self.latency).await;
                let user = User {
                    id: Uuid::new_v4().to_string(),
                    email: email.to_string(),
                    name: name.to_string(),
                    role,
                    created_at: Utc::now(),
                };
                self.commit(Some(user.clone())).await?;
                Ok(user)
            })
            .await;

        match result {
            Ok(user) => {
                info!("Registered {} as {:?}", user.email, user.role);
                self.notifier
                    .notify(Notification::success("Account created successfully"));
                Ok(user)
            }
            Err(e) => {
                warn!("Registration for {} failed: {}", email, e);
                self.notifier
                    .notify(Notification::error("Failed to create account"));
                Err(e)
            }
        }
    }

    /// Ends the session. The account itself is unaffected.
    pub async fn logout(&self) -> Result<(), SessionError> {
        match self.commit(None).await {
            Ok(()) => {
                info!("Session cleared");
                self.notifier
                    .notify(Notification::success("Logged out successfully"));
                Ok(())
            }
            Err(e) => {
                warn!("Logout failed: {}", e);
                self.notifier.notify(Notification::error("Failed to log out"));
                Err(e)
            }
        }
    }

    // Persists first; the in-memory user only changes once storage accepted it.
    async fn commit(&self, user: Option<User>) -> Result<(), SessionError> {
        let mut state = self.state.write().await;
        match &user {
            Some(u) => write_json(self.storage.as_ref(), USER_KEY, u).await?,
            None => self.storage.remove(USER_KEY).await?,
        }
        state.user = user;
        Ok(())
    }

    async fn while_loading<F, T>(&self, operation: F) -> Result<T, SessionError>
    where
        F: std::future::Future<Output = Result<T, SessionError>>,
    {
        self.state.write().await.loading = true;
        let result = operation.await;
        self.state.write().await.loading = false;
        result
    }
}
