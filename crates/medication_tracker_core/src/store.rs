//! crates/medication_tracker_core/src/store.rs
//!
//! The medication tracking store: the medications and logs collections,
//! their CRUD operations and the adherence queries over them.
//!
//! Every mutation computes the next collection, writes the full snapshot to
//! storage and only then commits it in memory and publishes it to
//! subscribers. A rejected write leaves the store exactly as it was.
//! Mutations are refused with [`PortError::NotReady`] until [`initialize`]
//! has loaded both collections.
//!
//! [`initialize`]: MedicationStore::initialize

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::adherence::{adherence_rate, AdherenceReport};
use crate::dashboard::DashboardSummary;
use crate::domain::{
    LogStatus, Medication, MedicationLog, MedicationPatch, NewMedication, StoreSnapshot,
    DEFAULT_PATIENT_ID,
};
use crate::draft::check_date_order;
use crate::persist::{read_json, write_json, LOGS_KEY, MEDICATIONS_KEY};
use crate::ports::{Notification, NotificationService, PortError, PortResult, StorageService};
use crate::seed::{default_logs, default_medications};
use crate::session::SessionStore;

pub struct MedicationStore {
    storage: Arc<dyn StorageService>,
    notifier: Arc<dyn NotificationService>,
    session: Arc<SessionStore>,
    state: watch::Sender<StoreSnapshot>,
    /// Serializes mutations so each one computes from the latest commit.
    write_lock: Mutex<()>,
}

impl MedicationStore {
    /// Creates an empty store in the loading state. Call [`initialize`]
    /// before use.
    ///
    /// [`initialize`]: MedicationStore::initialize
    pub fn new(
        storage: Arc<dyn StorageService>,
        notifier: Arc<dyn NotificationService>,
        session: Arc<SessionStore>,
    ) -> Self {
        let (state, _) = watch::channel(StoreSnapshot::default());
        Self {
            storage,
            notifier,
            session,
            state,
            write_lock: Mutex::new(()),
        }
    }

    /// Loads both collections from storage. A missing collection is seeded
    /// with the built-in defaults, which are persisted right away.
    pub async fn initialize(&self) -> PortResult<()> {
        let _guard = self.write_lock.lock().await;

        let medications = self
            .load_or_seed(MEDICATIONS_KEY, default_medications)
            .await?;
        let logs = self
            .load_or_seed(LOGS_KEY, || default_logs(Utc::now()))
            .await?;

        info!(
            "Medication store ready: {} medications, {} logs",
            medications.len(),
            logs.len()
        );
        self.state.send_replace(StoreSnapshot {
            medications,
            logs,
            loading: false,
        });
        Ok(())
    }

    async fn load_or_seed<T, F>(&self, key: &str, defaults: F) -> PortResult<Vec<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Vec<T>,
    {
        if let Some(saved) = read_json(self.storage.as_ref(), key).await? {
            return Ok(saved);
        }
        info!("No '{}' in storage, seeding defaults", key);
        let seeded = defaults();
        write_json(self.storage.as_ref(), key, &seeded).await?;
        Ok(seeded)
    }

    //=====================================================================================
    // Reads
    //=====================================================================================

    pub fn snapshot(&self) -> StoreSnapshot {
        self.state.borrow().clone()
    }

    /// Receives every committed state, starting with the current one.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.state.subscribe()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn medications(&self) -> Vec<Medication> {
        self.state.borrow().medications.clone()
    }

    pub fn logs(&self) -> Vec<MedicationLog> {
        self.state.borrow().logs.clone()
    }

    pub fn medication(&self, id: &str) -> Option<Medication> {
        self.state
            .borrow()
            .medications
            .iter()
            .find(|m| m.id == id)
            .cloned()
    }

    pub fn logs_for(&self, medication_id: &str) -> Vec<MedicationLog> {
        self.state
            .borrow()
            .logs
            .iter()
            .filter(|log| log.medication_id == medication_id)
            .cloned()
            .collect()
    }

    /// Percentage of `taken` logs for one medication, or for all logs when
    /// `medication_id` is `None`. Returns 0 when no log is in scope.
    pub fn adherence_rate(&self, medication_id: Option<&str>) -> u8 {
        adherence_rate(&self.state.borrow().logs, medication_id)
    }

    pub fn adherence_report(&self, medication_id: Option<&str>) -> AdherenceReport {
        AdherenceReport::compute(&self.state.borrow().logs, medication_id)
    }

    pub fn dashboard(&self, today: NaiveDate) -> DashboardSummary {
        let state = self.state.borrow();
        DashboardSummary::compute(&state.medications, &state.logs, today)
    }

    //=====================================================================================
    // Mutations
    //=====================================================================================

    pub async fn add_medication(&self, input: NewMedication) -> PortResult<Medication> {
        let result: PortResult<Medication> = async {
            input.check()?;
            let _guard = self.write_lock.lock().await;
            self.ensure_ready()?;
            let created = input.into_medication(Uuid::new_v4().to_string(), Utc::now());
            let mut next = self.medications();
            next.push(created.clone());
            self.commit_medications(next).await?;
            Ok(created)
        }
        .await;

        let created = self.report(
            result,
            "Medication added successfully",
            "Failed to add medication",
        )?;
        info!("Added medication {} ({})", created.name, created.id);
        Ok(created)
    }

    /// Writes the supplied fields onto the medication with `id`. Returns the
    /// updated record, or `None` when no medication matches.
    pub async fn update_medication(
        &self,
        id: &str,
        patch: MedicationPatch,
    ) -> PortResult<Option<Medication>> {
        let result: PortResult<Option<Medication>> = async {
            let patch = patch.normalized()?;
            let _guard = self.write_lock.lock().await;
            self.ensure_ready()?;
            let mut next = self.medications();
            let Some(target) = next.iter_mut().find(|m| m.id == id) else {
                return Ok(None);
            };
            patch.apply_to(target);
            check_date_order(target.start_date, target.end_date)?;
            let updated = target.clone();
            self.commit_medications(next).await?;
            Ok(Some(updated))
        }
        .await;

        match result {
            Ok(None) => {
                debug!("Update of unknown medication {} ignored", id);
                Ok(None)
            }
            other => self.report(
                other,
                "Medication updated successfully",
                "Failed to update medication",
            ),
        }
    }

    /// Removes the medication with `id`. Its logs are kept. Returns whether a
    /// medication was removed.
    pub async fn delete_medication(&self, id: &str) -> PortResult<bool> {
        let result: PortResult<bool> = async {
            let _guard = self.write_lock.lock().await;
            self.ensure_ready()?;
            let current = self.medications();
            let before = current.len();
            let next: Vec<_> = current.into_iter().filter(|m| m.id != id).collect();
            if next.len() == before {
                return Ok(false);
            }
            self.commit_medications(next).await?;
            Ok(true)
        }
        .await;

        match result {
            Ok(false) => {
                debug!("Delete of unknown medication {} ignored", id);
                Ok(false)
            }
            other => self.report(
                other,
                "Medication deleted successfully",
                "Failed to delete medication",
            ),
        }
    }

    /// Appends a dose event for `medication_id`, attributed to the active
    /// user. The medication is not required to exist.
    pub async fn log_medication(
        &self,
        medication_id: &str,
        status: LogStatus,
        notes: Option<String>,
    ) -> PortResult<MedicationLog> {
        let patient_id = self
            .session
            .current_user()
            .await
            .map(|u| u.id)
            .unwrap_or_else(|| DEFAULT_PATIENT_ID.to_string());

        let result: PortResult<MedicationLog> = async {
            let _guard = self.write_lock.lock().await;
            self.ensure_ready()?;
            let log = MedicationLog {
                id: Uuid::new_v4().to_string(),
                medication_id: medication_id.to_string(),
                patient_id,
                taken_at: Utc::now(),
                status,
                notes,
                photo_url: None,
            };
            let mut next = self.logs();
            next.push(log.clone());
            write_json(self.storage.as_ref(), LOGS_KEY, &next).await?;
            self.state.send_modify(|s| s.logs = next);
            Ok(log)
        }
        .await;

        self.report(
            result,
            format!("Medication marked as {}", status),
            "Failed to log medication",
        )
    }

    // An unloaded store holds empty collections; writing them would replace
    // what is in storage.
    fn ensure_ready(&self) -> PortResult<()> {
        if self.loading() {
            return Err(PortError::NotReady);
        }
        Ok(())
    }

    // Caller holds `write_lock`.
    async fn commit_medications(&self, next: Vec<Medication>) -> PortResult<()> {
        write_json(self.storage.as_ref(), MEDICATIONS_KEY, &next).await?;
        self.state.send_modify(|s| s.medications = next);
        Ok(())
    }

    fn report<T>(
        &self,
        result: PortResult<T>,
        success: impl Into<String>,
        failure: &str,
    ) -> PortResult<T> {
        match &result {
            Ok(_) => self.notifier.notify(Notification::success(success)),
            Err(e) => {
                error!("{}: {}", failure, e);
                self.notifier.notify(Notification::error(failure));
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{InMemoryStorage, RecordingNotifier};
    use crate::ports::NotificationLevel;
    use std::time::Duration;

    struct Fixture {
        store: MedicationStore,
        storage: Arc<InMemoryStorage>,
        notifier: Arc<RecordingNotifier>,
        session: Arc<SessionStore>,
    }

    fn fixture_with(storage: InMemoryStorage) -> Fixture {
        let storage = Arc::new(storage);
        let notifier = Arc::new(RecordingNotifier::new());
        let session = Arc::new(SessionStore::new(
            storage.clone(),
            notifier.clone(),
            Duration::ZERO,
        ));
        let store = MedicationStore::new(storage.clone(), notifier.clone(), session.clone());
        Fixture {
            store,
            storage,
            notifier,
            session,
        }
    }

    async fn seeded() -> Fixture {
        let fx = fixture_with(InMemoryStorage::new());
        fx.store.initialize().await.unwrap();
        fx
    }

    fn new_medication(name: &str) -> NewMedication {
        NewMedication {
            name: name.to_string(),
            dosage: "10mg".to_string(),
            frequency: "Once daily".to_string(),
            time_slots: vec!["09:00".to_string()],
            start_date: NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            end_date: None,
            patient_id: "1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_initialize_seeds_and_persists_defaults() {
        let fx = fixture_with(InMemoryStorage::new());
        assert!(fx.store.loading());

        fx.store.initialize().await.unwrap();

        assert!(!fx.store.loading());
        assert_eq!(fx.store.medications().len(), 2);
        assert_eq!(fx.store.logs().len(), 1);
        assert!(fx.storage.get(MEDICATIONS_KEY).await.unwrap().is_some());
        assert!(fx.storage.get(LOGS_KEY).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_initialize_keeps_stored_collections() {
        let fx = fixture_with(InMemoryStorage::with_entries([
            (MEDICATIONS_KEY, "[]"),
            (LOGS_KEY, "[]"),
        ]));
        fx.store.initialize().await.unwrap();
        assert!(fx.store.medications().is_empty());
        assert!(fx.store.logs().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_rejects_corrupt_collection() {
        let fx = fixture_with(InMemoryStorage::with_entries([(MEDICATIONS_KEY, "{not json")]));

        let err = fx.store.initialize().await.unwrap_err();
        assert!(matches!(err, PortError::Serialization { .. }));
        assert!(fx.store.loading());
        assert_eq!(
            fx.storage.get(MEDICATIONS_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[tokio::test]
    async fn test_seeded_adherence_scenario() {
        let fx = seeded().await;
        assert_eq!(fx.store.adherence_rate(None), 100);

        fx.store
            .log_medication("1", LogStatus::Missed, None)
            .await
            .unwrap();
        assert_eq!(fx.store.adherence_rate(Some("1")), 50);
        assert_eq!(fx.store.adherence_rate(Some("2")), 0);
    }

    #[tokio::test]
    async fn test_add_medication_appends_with_fresh_id() {
        let fx = seeded().await;
        let before = fx.store.medications();

        let created = fx
            .store
            .add_medication(new_medication("Atorvastatin"))
            .await
            .unwrap();

        assert!(!created.id.is_empty());
        assert!(before.iter().all(|m| m.id != created.id));
        let after = fx.store.medications();
        assert_eq!(after.len(), before.len() + 1);
        assert_eq!(after.last(), Some(&created));

        let toasts = fx.notifier.notifications();
        assert_eq!(toasts.last().unwrap().description, "Medication added successfully");
    }

    #[tokio::test]
    async fn test_rapid_adds_get_distinct_ids() {
        let fx = seeded().await;
        let a = fx.store.add_medication(new_medication("A")).await.unwrap();
        let b = fx.store.add_medication(new_medication("B")).await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_update_changes_only_supplied_fields() {
        let fx = seeded().await;
        let original = fx.store.medication("1").unwrap();

        let updated = fx
            .store
            .update_medication(
                "1",
                MedicationPatch {
                    dosage: Some("20mg".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.dosage, "20mg");
        assert_eq!(
            Medication {
                dosage: original.dosage.clone(),
                ..updated.clone()
            },
            original
        );
        assert_eq!(fx.store.medication("1"), Some(updated));
    }

    #[tokio::test]
    async fn test_update_and_delete_of_unknown_id_are_noops() {
        let fx = seeded().await;
        let before = fx.store.snapshot();
        let toasts_before = fx.notifier.notifications().len();

        let patch = MedicationPatch {
            name: Some("Ghost".to_string()),
            ..Default::default()
        };
        assert_eq!(fx.store.update_medication("missing", patch).await.unwrap(), None);
        assert!(!fx.store.delete_medication("missing").await.unwrap());

        assert_eq!(fx.store.snapshot(), before);
        assert_eq!(fx.notifier.notifications().len(), toasts_before);
    }

    #[tokio::test]
    async fn test_delete_keeps_logs() {
        let fx = seeded().await;
        assert!(fx.store.delete_medication("1").await.unwrap());

        assert!(fx.store.medication("1").is_none());
        assert_eq!(fx.store.medications().len(), 1);
        assert_eq!(fx.store.logs_for("1").len(), 1);
        assert_eq!(fx.store.adherence_rate(Some("1")), 100);
    }

    #[tokio::test]
    async fn test_log_uses_active_user_or_fallback() {
        let fx = seeded().await;
        let anonymous = fx
            .store
            .log_medication("2", LogStatus::Skipped, Some("felt sick".to_string()))
            .await
            .unwrap();
        assert_eq!(anonymous.patient_id, DEFAULT_PATIENT_ID);
        assert_eq!(anonymous.notes.as_deref(), Some("felt sick"));

        fx.session.login("caretaker@demo.com", "pw").await.unwrap();
        let attributed = fx
            .store
            .log_medication("no-such-medication", LogStatus::Taken, None)
            .await
            .unwrap();
        assert_eq!(attributed.patient_id, "2");
        assert_eq!(fx.store.logs().last(), Some(&attributed));

        let toasts = fx.notifier.notifications();
        assert_eq!(toasts.last().unwrap().description, "Medication marked as taken");
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back() {
        let fx = seeded().await;
        let before = fx.store.snapshot();
        let mut updates = fx.store.subscribe();
        updates.borrow_and_update();

        fx.storage.set_fail_writes(true);
        assert!(fx.store.add_medication(new_medication("X")).await.is_err());
        assert!(fx
            .store
            .log_medication("1", LogStatus::Taken, None)
            .await
            .is_err());
        assert!(fx.store.delete_medication("1").await.is_err());

        assert_eq!(fx.store.snapshot(), before);
        assert!(!updates.has_changed().unwrap());

        let errors: Vec<_> = fx
            .notifier
            .notifications()
            .into_iter()
            .filter(|n| n.level == NotificationLevel::Error)
            .map(|n| n.description)
            .collect();
        assert_eq!(
            errors,
            vec![
                "Failed to add medication",
                "Failed to log medication",
                "Failed to delete medication"
            ]
        );
    }

    #[tokio::test]
    async fn test_subscribers_see_commits() {
        let fx = seeded().await;
        let mut updates = fx.store.subscribe();
        updates.borrow_and_update();

        fx.store.add_medication(new_medication("Y")).await.unwrap();

        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().medications.len(), 3);
    }

    #[tokio::test]
    async fn test_reload_reproduces_collections() {
        let fx = seeded().await;
        fx.store.add_medication(new_medication("Z")).await.unwrap();
        fx.store
            .log_medication("2", LogStatus::Missed, None)
            .await
            .unwrap();

        let reloaded = MedicationStore::new(
            fx.storage.clone(),
            fx.notifier.clone(),
            fx.session.clone(),
        );
        reloaded.initialize().await.unwrap();

        assert_eq!(reloaded.medications(), fx.store.medications());
        assert_eq!(reloaded.logs(), fx.store.logs());
    }

    #[tokio::test]
    async fn test_mutations_after_failed_initialize_keep_stored_value() {
        let fx = fixture_with(InMemoryStorage::with_entries([(MEDICATIONS_KEY, "{not json")]));
        assert!(fx.store.initialize().await.is_err());

        let err = fx.store.add_medication(new_medication("X")).await.unwrap_err();
        assert!(matches!(err, PortError::NotReady));
        assert!(matches!(
            fx.store.delete_medication("1").await,
            Err(PortError::NotReady)
        ));

        assert_eq!(
            fx.storage.get(MEDICATIONS_KEY).await.unwrap().as_deref(),
            Some("{not json")
        );
        let toasts = fx.notifier.notifications();
        assert_eq!(toasts.last().unwrap().level, NotificationLevel::Error);
    }

    #[tokio::test]
    async fn test_uninitialized_store_does_not_shrink_storage() {
        let first = seeded().await;
        let stored_meds = first.storage.get(MEDICATIONS_KEY).await.unwrap();
        let stored_logs = first.storage.get(LOGS_KEY).await.unwrap();

        let second = MedicationStore::new(
            first.storage.clone(),
            first.notifier.clone(),
            first.session.clone(),
        );
        assert!(second.add_medication(new_medication("X")).await.is_err());
        let patch = MedicationPatch {
            dosage: Some("5mg".to_string()),
            ..Default::default()
        };
        assert!(second.update_medication("1", patch).await.is_err());
        assert!(second
            .log_medication("1", LogStatus::Taken, None)
            .await
            .is_err());

        assert_eq!(first.storage.get(MEDICATIONS_KEY).await.unwrap(), stored_meds);
        assert_eq!(first.storage.get(LOGS_KEY).await.unwrap(), stored_logs);
    }

    #[tokio::test]
    async fn test_add_drops_blank_time_slots() {
        let fx = seeded().await;
        let input = NewMedication {
            time_slots: vec!["".to_string(), "08:00".to_string(), " ".to_string()],
            ..new_medication("Slots")
        };

        let created = fx.store.add_medication(input).await.unwrap();

        assert_eq!(created.time_slots, vec!["08:00"]);
        assert_eq!(fx.store.medication(&created.id).unwrap().time_slots, vec!["08:00"]);
    }

    #[tokio::test]
    async fn test_invalid_input_is_rejected_without_writing() {
        let fx = seeded().await;
        let before = fx.store.snapshot();

        let blank = fx.store.add_medication(new_medication("  ")).await;
        assert!(matches!(blank, Err(PortError::Invalid(_))));

        let blank_name = MedicationPatch {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            fx.store.update_medication("1", blank_name).await,
            Err(PortError::Invalid(_))
        ));

        let early_end = MedicationPatch {
            end_date: Some(NaiveDate::from_ymd_opt(2000, 1, 1)),
            ..Default::default()
        };
        assert!(matches!(
            fx.store.update_medication("1", early_end).await,
            Err(PortError::Invalid(_))
        ));

        assert_eq!(fx.store.snapshot(), before);
        assert_eq!(fx.store.medication("1").unwrap().name, "Lisinopril");
    }
}
