//! crates/medication_tracker_core/src/domain.rs
//!
//! Defines the core data structures for the application.
//! Field names serialize in camelCase, which is also the layout of the
//! snapshots written to durable storage.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Fallback patient id used when a dose is logged without an active session.
pub const DEFAULT_PATIENT_ID: &str = "1";

/// The recommended dosing frequencies offered to the user.
/// A medication's frequency is free text and is not constrained to this set.
pub const FREQUENCY_OPTIONS: [&str; 9] = [
    "Once daily",
    "Twice daily",
    "Three times daily",
    "Four times daily",
    "Every 2 hours",
    "Every 4 hours",
    "Every 6 hours",
    "Every 8 hours",
    "As needed",
];

//=========================================================================================
// Users
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Caretaker,
}

/// The identity held by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// Medications
//=========================================================================================

/// A prescribed regimen owned by exactly one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    /// "HH:MM" strings, in the order the user entered them.
    pub time_slots: Vec<String>,
    pub start_date: NaiveDate,
    /// `None` means the regimen is ongoing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub patient_id: String,
    pub created_at: DateTime<Utc>,
}

/// Input of the add operation: a medication before it has an id and a
/// creation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub time_slots: Vec<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub patient_id: String,
}

impl NewMedication {
    pub(crate) fn into_medication(self, id: String, created_at: DateTime<Utc>) -> Medication {
        Medication {
            id,
            name: self.name,
            dosage: self.dosage,
            frequency: self.frequency,
            time_slots: self
                .time_slots
                .into_iter()
                .filter(|slot| !slot.trim().is_empty())
                .collect(),
            start_date: self.start_date,
            end_date: self.end_date,
            patient_id: self.patient_id,
            created_at,
        }
    }
}

/// A partial update. Only the fields that are `Some` are written.
///
/// `end_date` is doubly optional: an absent key leaves the end date alone,
/// an explicit `null` clears it back to "ongoing".
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub time_slots: Option<Vec<String>>,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "present")]
    pub end_date: Option<Option<NaiveDate>>,
    pub patient_id: Option<String>,
}

impl MedicationPatch {
    /// Writes the supplied fields onto `medication`. Id and creation time are
    /// not part of a patch and never change.
    pub fn apply_to(&self, medication: &mut Medication) {
        if let Some(name) = &self.name {
            medication.name = name.clone();
        }
        if let Some(dosage) = &self.dosage {
            medication.dosage = dosage.clone();
        }
        if let Some(frequency) = &self.frequency {
            medication.frequency = frequency.clone();
        }
        if let Some(slots) = &self.time_slots {
            medication.time_slots = slots
                .iter()
                .filter(|slot| !slot.trim().is_empty())
                .cloned()
                .collect();
        }
        if let Some(start_date) = self.start_date {
            medication.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            medication.end_date = end_date;
        }
        if let Some(patient_id) = &self.patient_id {
            medication.patient_id = patient_id.clone();
        }
    }
}

/// Maps a present key (even `null`) to `Some(..)` so it can be told apart
/// from a missing one.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

//=========================================================================================
// Logs
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogStatus {
    Taken,
    Missed,
    Skipped,
}

impl fmt::Display for LogStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LogStatus::Taken => "taken",
            LogStatus::Missed => "missed",
            LogStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// A single dose event. `medication_id` is not enforced and may dangle after
/// the medication is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationLog {
    pub id: String,
    pub medication_id: String,
    pub patient_id: String,
    pub taken_at: DateTime<Utc>,
    pub status: LogStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

//=========================================================================================
// Published state
//=========================================================================================

/// Everything a subscriber needs to render: both collections plus the
/// initial-load flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub medications: Vec<Medication>,
    pub logs: Vec<MedicationLog>,
    pub loading: bool,
}

impl Default for StoreSnapshot {
    fn default() -> Self {
        Self {
            medications: Vec::new(),
            logs: Vec::new(),
            loading: true,
        }
    }
}
