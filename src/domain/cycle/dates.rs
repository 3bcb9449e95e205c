//! Validated fasting interval.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, ValidationError};

/// Start and end of a fasting interval, with `start_date < end_date`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "RawCycleDates")]
pub struct CycleDates {
    start_date: Timestamp,
    end_date: Timestamp,
}

impl CycleDates {
    /// Creates a validated interval.
    ///
    /// # Errors
    ///
    /// `InvalidFormat` on `end_date` when it is not strictly after `start_date`.
    pub fn new(start_date: Timestamp, end_date: Timestamp) -> Result<Self, ValidationError> {
        if !end_date.is_after(&start_date) {
            return Err(ValidationError::invalid_format(
                "end_date",
                format!("must be after start_date ({} >= {})", start_date, end_date),
            ));
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    pub fn start_date(&self) -> Timestamp {
        self.start_date
    }

    pub fn end_date(&self) -> Timestamp {
        self.end_date
    }

    /// Length of the interval.
    pub fn duration(&self) -> chrono::Duration {
        self.end_date.duration_since(&self.start_date)
    }

    /// Returns true if the two half-open intervals share any instant.
    pub fn overlaps(&self, other: &CycleDates) -> bool {
        self.start_date.is_before(&other.end_date) && other.start_date.is_before(&self.end_date)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCycleDates {
    start_date: Timestamp,
    end_date: Timestamp,
}

impl TryFrom<RawCycleDates> for CycleDates {
    type Error = ValidationError;

    fn try_from(raw: RawCycleDates) -> Result<Self, Self::Error> {
        Self::new(raw.start_date, raw.end_date)
    }
}
