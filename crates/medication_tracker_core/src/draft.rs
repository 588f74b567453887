//! Typed validation of the "add medication" form, and the field rules every
//! stored medication keeps.

use chrono::{NaiveDate, NaiveTime};
use serde::Deserialize;

use crate::domain::{MedicationPatch, NewMedication};
use crate::ports::PortError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Invalid time slot '{0}', expected HH:MM")]
    InvalidTimeSlot(String),
    #[error("Invalid {field} '{value}', expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },
    #[error("End date {end} is before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
}

impl From<DraftError> for PortError {
    fn from(e: DraftError) -> Self {
        PortError::Invalid(e.to_string())
    }
}

/// Raw form values, exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MedicationDraft {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub time_slots: Vec<String>,
    pub start_date: String,
    pub end_date: String,
}

impl MedicationDraft {
    /// Checks the draft and turns it into the add-operation input for
    /// `patient_id`. Blank time slots are dropped.
    pub fn validate(&self, patient_id: &str) -> Result<NewMedication, DraftError> {
        let name = required("name", &self.name)?;
        let dosage = required("dosage", &self.dosage)?;
        let frequency = required("frequency", &self.frequency)?;

        let time_slots = normalize_slots(&self.time_slots)?;

        let start_date = parse_date("start date", required("start date", &self.start_date)?)?;
        let end_date = match self.end_date.trim() {
            "" => None,
            raw => Some(parse_date("end date", raw)?),
        };
        check_date_order(start_date, end_date)?;

        Ok(NewMedication {
            name: name.to_string(),
            dosage: dosage.to_string(),
            frequency: frequency.to_string(),
            time_slots,
            start_date,
            end_date,
            patient_id: patient_id.to_string(),
        })
    }
}

impl NewMedication {
    /// Checks the rules the form enforces on input that did not come through
    /// a [`MedicationDraft`].
    pub fn check(&self) -> Result<(), DraftError> {
        required("name", &self.name)?;
        required("dosage", &self.dosage)?;
        required("frequency", &self.frequency)?;
        required("patient id", &self.patient_id)?;
        normalize_slots(&self.time_slots)?;
        check_date_order(self.start_date, self.end_date)
    }
}

impl MedicationPatch {
    /// Returns the patch with text fields trimmed and time slots normalized.
    /// A supplied field may not be blank. Date order is checked against the
    /// patched record, see [`check_date_order`].
    pub fn normalized(&self) -> Result<MedicationPatch, DraftError> {
        let text = |field: &'static str, value: &Option<String>| {
            value
                .as_deref()
                .map(|v| required(field, v).map(str::to_string))
                .transpose()
        };
        Ok(MedicationPatch {
            name: text("name", &self.name)?,
            dosage: text("dosage", &self.dosage)?,
            frequency: text("frequency", &self.frequency)?,
            time_slots: self
                .time_slots
                .as_deref()
                .map(normalize_slots)
                .transpose()?,
            start_date: self.start_date,
            end_date: self.end_date,
            patient_id: text("patient id", &self.patient_id)?,
        })
    }
}

pub fn check_date_order(start: NaiveDate, end: Option<NaiveDate>) -> Result<(), DraftError> {
    match end {
        Some(end) if end < start => Err(DraftError::EndBeforeStart { start, end }),
        _ => Ok(()),
    }
}

// Drops blank slots.
fn normalize_slots(slots: &[String]) -> Result<Vec<String>, DraftError> {
    slots
        .iter()
        .map(|slot| slot.trim())
        .filter(|slot| !slot.is_empty())
        .map(parse_slot)
        .collect()
}

fn required<'a>(field: &'static str, value: &'a str) -> Result<&'a str, DraftError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(DraftError::MissingField(field))
    } else {
        Ok(trimmed)
    }
}

// Normalizes to zero-padded "HH:MM".
fn parse_slot(raw: &str) -> Result<String, DraftError> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .map(|time| time.format("%H:%M").to_string())
        .map_err(|_| DraftError::InvalidTimeSlot(raw.to_string()))
}

fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, DraftError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| DraftError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}
