//! Built-in data: the demo accounts and the collections a fresh environment
//! starts with.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::domain::{LogStatus, Medication, MedicationLog, Role, User};

fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn first_of_2024() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default()
}

/// The two accounts a login can resolve to.
pub fn demo_users() -> Vec<User> {
    vec![
        User {
            id: "1".to_string(),
            email: "patient@demo.com".to_string(),
            name: "John Patient".to_string(),
            role: Role::Patient,
            created_at: epoch(),
        },
        User {
            id: "2".to_string(),
            email: "caretaker@demo.com".to_string(),
            name: "Sarah Caretaker".to_string(),
            role: Role::Caretaker,
            created_at: epoch(),
        },
    ]
}

pub fn default_medications() -> Vec<Medication> {
    vec![
        Medication {
            id: "1".to_string(),
            name: "Lisinopril".to_string(),
            dosage: "10mg".to_string(),
            frequency: "Once daily".to_string(),
            time_slots: vec!["08:00".to_string()],
            start_date: first_of_2024(),
            end_date: None,
            patient_id: "1".to_string(),
            created_at: epoch(),
        },
        Medication {
            id: "2".to_string(),
            name: "Metformin".to_string(),
            dosage: "500mg".to_string(),
            frequency: "Twice daily".to_string(),
            time_slots: vec!["08:00".to_string(), "20:00".to_string()],
            start_date: first_of_2024(),
            end_date: None,
            patient_id: "1".to_string(),
            created_at: epoch(),
        },
    ]
}

/// A single "taken" dose of medication `1`, stamped `now`.
pub fn default_logs(now: DateTime<Utc>) -> Vec<MedicationLog> {
    vec![MedicationLog {
        id: "1".to_string(),
        medication_id: "1".to_string(),
        patient_id: "1".to_string(),
        taken_at: now,
        status: LogStatus::Taken,
        notes: None,
        photo_url: None,
    }]
}
