//! Derived statistics shown on the dashboard.

use chrono::NaiveDate;
use serde::Serialize;

use crate::adherence::adherence_rate;
use crate::domain::{LogStatus, Medication, MedicationLog};

/// How many log entries the recent-activity feed shows.
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// Label for a log whose medication no longer exists.
pub const UNKNOWN_MEDICATION: &str = "Unknown medication";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub log: MedicationLog,
    /// `None` when the log references a deleted medication.
    pub medication_name: Option<String>,
}

impl ActivityEntry {
    pub fn display_name(&self) -> &str {
        self.medication_name.as_deref().unwrap_or(UNKNOWN_MEDICATION)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicationAdherence {
    pub medication_id: String,
    pub name: String,
    pub rate: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub overall_adherence: u8,
    pub taken_today: usize,
    pub active_prescriptions: usize,
    /// Newest first.
    pub recent_activity: Vec<ActivityEntry>,
    pub per_medication: Vec<MedicationAdherence>,
}

impl DashboardSummary {
    pub fn compute(medications: &[Medication], logs: &[MedicationLog], today: NaiveDate) -> Self {
        let taken_today = logs
            .iter()
            .filter(|log| log.status == LogStatus::Taken && log.taken_at.date_naive() == today)
            .count();

        let recent_activity = logs
            .iter()
            .rev()
            .take(RECENT_ACTIVITY_LIMIT)
            .map(|log| ActivityEntry {
                log: log.clone(),
                medication_name: medications
                    .iter()
                    .find(|m| m.id == log.medication_id)
                    .map(|m| m.name.clone()),
            })
            .collect();

        let per_medication = medications
            .iter()
            .map(|m| MedicationAdherence {
                medication_id: m.id.clone(),
                name: m.name.clone(),
                rate: adherence_rate(logs, Some(&m.id)),
            })
            .collect();

        Self {
            overall_adherence: adherence_rate(logs, None),
            taken_today,
            active_prescriptions: medications.len(),
            recent_activity,
            per_medication,
        }
    }
}
