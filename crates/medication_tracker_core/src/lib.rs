pub mod adherence;
pub mod dashboard;
pub mod domain;
pub mod draft;
pub mod memory;
pub mod persist;
pub mod ports;
pub mod seed;
pub mod session;
pub mod store;

pub use adherence::{adherence_rate, AdherenceReport};
pub use dashboard::{ActivityEntry, DashboardSummary, MedicationAdherence};
pub use domain::{
    LogStatus, Medication, MedicationLog, MedicationPatch, NewMedication, Role, StoreSnapshot,
    User, DEFAULT_PATIENT_ID, FREQUENCY_OPTIONS,
};
pub use draft::{DraftError, MedicationDraft};
pub use ports::{
    Notification, NotificationLevel, NotificationService, PortError, PortResult, StorageService,
};
pub use session::{SessionError, SessionStore};
pub use store::MedicationStore;
