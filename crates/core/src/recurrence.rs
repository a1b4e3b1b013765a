//! Recurrence calculation for notification jobs.
//!
//! [`next_fire`] advances a schedule by exactly one unit of its frequency,
//! anchored on the previous fire time rather than on "now", so a job that
//! fires late does not drift relative to its original schedule.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, Months};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

/// How often a job re-fires after its first send.
///
/// Stored as TEXT in the `notification_jobs` row; the serde representation
/// matches the column values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Frequency {
    Once,
    Hourly,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    /// Column / wire value for this frequency.
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Once => "ONCE",
            Frequency::Hourly => "HOURLY",
            Frequency::Daily => "DAILY",
            Frequency::Weekly => "WEEKLY",
            Frequency::Monthly => "MONTHLY",
        }
    }

    /// Whether the job re-enters the due set after its first fire.
    pub fn is_recurring(self) -> bool {
        !matches!(self, Frequency::Once)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ONCE" => Ok(Frequency::Once),
            "HOURLY" => Ok(Frequency::Hourly),
            "DAILY" => Ok(Frequency::Daily),
            "WEEKLY" => Ok(Frequency::Weekly),
            "MONTHLY" => Ok(Frequency::Monthly),
            other => Err(CoreError::Validation(format!(
                "Unknown frequency: {other}"
            ))),
        }
    }
}

/// Next fire time for a job, or `None` for one-shot jobs.
///
/// The result is exactly one `frequency` unit after `anchor`, regardless of
/// the wall clock at computation time. Monthly addition is calendar-aware:
/// Jan 31 + 1 month = Feb 28 (29 in leap years).
pub fn next_fire(anchor: Timestamp, frequency: Frequency) -> Option<Timestamp> {
    match frequency {
        Frequency::Once => None,
        Frequency::Hourly => Some(anchor + Duration::hours(1)),
        Frequency::Daily => Some(anchor + Duration::days(1)),
        Frequency::Weekly => Some(anchor + Duration::weeks(1)),
        Frequency::Monthly => anchor.checked_add_months(Months::new(1)),
    }
}
