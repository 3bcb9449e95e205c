//! Aggregate figures over a user's completed cycles.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::CycleStatus;

use super::CycleRecord;

/// Fasting statistics for one user. Durations are in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleStatistics {
    pub completed_cycles: u32,
    pub total_fasting_secs: i64,
    pub average_fasting_secs: i64,
    pub longest_fasting_secs: i64,
    pub shortest_fasting_secs: i64,
    pub has_cycle_in_progress: bool,
}

impl CycleStatistics {
    /// Computes statistics from a user's records. In-progress records only
    /// contribute to `has_cycle_in_progress`.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CycleRecord>) -> Self {
        let mut stats = CycleStatistics::default();

        for record in records {
            if record.status != CycleStatus::Completed {
                stats.has_cycle_in_progress = true;
                continue;
            }
            let secs = record
                .end_date
                .duration_since(&record.start_date)
                .num_seconds()
                .max(0);
            stats.shortest_fasting_secs = if stats.completed_cycles == 0 {
                secs
            } else {
                stats.shortest_fasting_secs.min(secs)
            };
            stats.completed_cycles += 1;
            stats.total_fasting_secs += secs;
            stats.longest_fasting_secs = stats.longest_fasting_secs.max(secs);
        }

        if stats.completed_cycles > 0 {
            stats.average_fasting_secs = stats.total_fasting_secs / i64::from(stats.completed_cycles);
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cycle::CycleDates;
    use crate::domain::foundation::{CycleId, Timestamp, UserId};

    fn completed(hours: i64) -> CycleRecord {
        let start = Timestamp::parse_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let dates = CycleDates::new(start, start.plus_hours(hours)).unwrap();
        let mut record = CycleRecord::start(CycleId::new(), UserId::new("u1").unwrap(), dates);
        record.complete(dates).unwrap();
        record
    }

    #[test]
    fn empty_history_yields_zeroes() {
        assert_eq!(CycleStatistics::from_records(&Vec::<CycleRecord>::new()), CycleStatistics::default());
    }

    #[test]
    fn aggregates_completed_cycles() {
        let records = vec![completed(16), completed(20), completed(12)];
        let stats = CycleStatistics::from_records(&records);

        assert_eq!(stats.completed_cycles, 3);
        assert_eq!(stats.total_fasting_secs, 48 * 3600);
        assert_eq!(stats.average_fasting_secs, 16 * 3600);
        assert_eq!(stats.longest_fasting_secs, 20 * 3600);
        assert_eq!(stats.shortest_fasting_secs, 12 * 3600);
        assert!(!stats.has_cycle_in_progress);
    }

    #[test]
    fn in_progress_records_are_flagged_not_counted() {
        let start = Timestamp::parse_rfc3339("2024-02-01T00:00:00Z").unwrap();
        let running = CycleRecord::start(
            CycleId::new(),
            UserId::new("u1").unwrap(),
            CycleDates::new(start, start.plus_hours(16)).unwrap(),
        );
        let records = vec![completed(10), running];

        let stats = CycleStatistics::from_records(&records);

        assert_eq!(stats.completed_cycles, 1);
        assert!(stats.has_cycle_in_progress);
    }
}
