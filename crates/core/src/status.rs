//! Campaign lifecycle state machine.
//!
//! PENDING → ACTIVE ⇄ (re-fires) → COMPLETED (terminal, ONCE only) /
//! CANCELLED (terminal, external trigger only). A ONCE job transitions
//! PENDING → COMPLETED directly and never re-enters the due set.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Lifecycle state of a notification job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JobStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl JobStatus {
    /// Column / wire value for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Pending => "PENDING",
            JobStatus::Active => "ACTIVE",
            JobStatus::Completed => "COMPLETED",
            JobStatus::Cancelled => "CANCELLED",
        }
    }

    /// Terminal states never re-enter the due set.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Cancelled)
    }

    /// Returns the set of valid target statuses reachable from `self`.
    ///
    /// `Active → Active` models a recurring re-fire. Terminal states return
    /// an empty slice because no further transitions are allowed.
    pub fn valid_transitions(self) -> &'static [JobStatus] {
        match self {
            // First fire: recurring jobs go Active, ONCE jobs complete.
            JobStatus::Pending => &[JobStatus::Active, JobStatus::Completed, JobStatus::Cancelled],
            // Re-fire, complete (frequency edited down to ONCE), or cancel.
            JobStatus::Active => &[JobStatus::Active, JobStatus::Completed, JobStatus::Cancelled],
            JobStatus::Completed | JobStatus::Cancelled => &[],
        }
    }

    /// Check whether a transition from `self` to `to` is valid.
    pub fn can_transition(self, to: JobStatus) -> bool {
        self.valid_transitions().contains(&to)
    }

    /// Validate a state transition, returning a descriptive error for
    /// invalid ones.
    pub fn validate_transition(self, to: JobStatus) -> Result<(), CoreError> {
        if self.can_transition(to) {
            Ok(())
        } else {
            Err(CoreError::Conflict(format!(
                "Invalid status transition: {self} -> {to}"
            )))
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(JobStatus::Pending),
            "ACTIVE" => Ok(JobStatus::Active),
            "COMPLETED" => Ok(JobStatus::Completed),
            "CANCELLED" => Ok(JobStatus::Cancelled),
            other => Err(CoreError::Validation(format!("Unknown job status: {other}"))),
        }
    }
}
