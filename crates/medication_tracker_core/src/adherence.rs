//! Adherence statistics over a set of dose logs.

use serde::Serialize;

use crate::domain::{LogStatus, MedicationLog};

/// Status counts and the resulting rate for one scope (a medication or all).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceReport {
    pub taken: usize,
    pub missed: usize,
    pub skipped: usize,
    pub total: usize,
    /// Whole percent in `0..=100`.
    pub rate: u8,
}

impl AdherenceReport {
    /// Tallies the logs that match `medication_id`, or every log when it is
    /// `None`.
    pub fn compute(logs: &[MedicationLog], medication_id: Option<&str>) -> Self {
        let mut report = Self::default();
        for log in logs
            .iter()
            .filter(|log| medication_id.map_or(true, |id| log.medication_id == id))
        {
            match log.status {
                LogStatus::Taken => report.taken += 1,
                LogStatus::Missed => report.missed += 1,
                LogStatus::Skipped => report.skipped += 1,
            }
            report.total += 1;
        }
        report.rate = percent(report.taken, report.total);
        report
    }
}

/// Percentage of logs in scope whose status is `taken`, rounded half up.
/// An empty scope yields 0.
pub fn adherence_rate(logs: &[MedicationLog], medication_id: Option<&str>) -> u8 {
    AdherenceReport::compute(logs, medication_id).rate
}

// round(100 * part / whole) with .5 rounding up, in integer arithmetic.
fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    ((200 * part + whole) / (2 * whole)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn log(medication_id: &str, status: LogStatus) -> MedicationLog {
        MedicationLog {
            id: uuid::Uuid::new_v4().to_string(),
            medication_id: medication_id.to_string(),
            patient_id: "1".to_string(),
            taken_at: Utc::now(),
            status,
            notes: None,
            photo_url: None,
        }
    }

    #[test]
    fn empty_scope_is_zero() {
        assert_eq!(adherence_rate(&[], None), 0);
        let logs = vec![log("1", LogStatus::Taken)];
        assert_eq!(adherence_rate(&logs, Some("missing")), 0);
    }

    #[test]
    fn rounds_half_up() {
        // 1 of 8 = 12.5%
        let mut logs = vec![log("1", LogStatus::Taken)];
        logs.extend((0..7).map(|_| log("1", LogStatus::Missed)));
        assert_eq!(adherence_rate(&logs, None), 13);

        // 2 of 3 = 66.67%
        let logs = vec![
            log("1", LogStatus::Taken),
            log("1", LogStatus::Taken),
            log("1", LogStatus::Skipped),
        ];
        assert_eq!(adherence_rate(&logs, None), 67);

        // 1 of 3 = 33.33%
        let logs = vec![
            log("1", LogStatus::Taken),
            log("1", LogStatus::Missed),
            log("1", LogStatus::Missed),
        ];
        assert_eq!(adherence_rate(&logs, None), 33);
    }

    #[test]
    fn rate_stays_within_bounds() {
        for total in 1..=40usize {
            for taken in 0..=total {
                let mut logs: Vec<_> = (0..taken).map(|_| log("1", LogStatus::Taken)).collect();
                logs.extend((taken..total).map(|_| log("1", LogStatus::Missed)));
                let expected = (100.0 * taken as f64 / total as f64 + 0.5).floor() as u8;
                let rate = adherence_rate(&logs, Some("1"));
                assert!(rate <= 100);
                assert_eq!(rate, expected, "taken={taken} total={total}");
            }
        }
    }

    #[test]
    fn report_counts_each_status_for_the_scope() {
        let logs = vec![
            log("1", LogStatus::Taken),
            log("1", LogStatus::Missed),
            log("2", LogStatus::Skipped),
            log("2", LogStatus::Taken),
        ];

        let first = AdherenceReport::compute(&logs, Some("1"));
        assert_eq!((first.taken, first.missed, first.skipped, first.total), (1, 1, 0, 2));
        assert_eq!(first.rate, 50);

        let all = AdherenceReport::compute(&logs, None);
        assert_eq!(all.total, 4);
        assert_eq!(all.skipped, 1);
        assert_eq!(all.rate, 50);
    }
}
