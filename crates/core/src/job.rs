//! The notification job (campaign) domain model and its write DTOs.

use serde::Deserialize;
use validator::Validate;

use crate::error::CoreError;
use crate::message::PushMessage;
use crate::recurrence::Frequency;
use crate::status::JobStatus;
use crate::targeting::{
    deserialize_explicit_recipients, validate_targeting, AttributeFilter, ExplicitRecipients,
    TargetingStrategy,
};
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// NotificationJob
// ---------------------------------------------------------------------------

/// A declarative, possibly-recurring notification campaign.
///
/// Mutated by operator updates (content/schedule/targeting) and by the
/// scheduler (status, counters, `next_send_at` only). `total_sent` and
/// `total_failed` are channel-attempt counters and only ever grow.
#[derive(Debug, Clone)]
pub struct NotificationJob {
    pub id: DbId,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub redirect: Option<String>,
    pub message_type: String,
    /// First (or only) fire time.
    pub scheduled_at: Timestamp,
    pub frequency: Frequency,
    /// Non-null iff the job is recurring, has fired at least once, and is
    /// not in a terminal state.
    pub next_send_at: Option<Timestamp>,
    pub explicit_recipients: ExplicitRecipients,
    pub phone_numbers: Vec<String>,
    pub filter: AttributeFilter,
    pub status: JobStatus,
    pub last_sent_at: Option<Timestamp>,
    pub total_sent: i64,
    pub total_failed: i64,
    pub created_by: DbId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl NotificationJob {
    /// The due predicate evaluated by the scheduler each tick.
    pub fn is_due(&self, now: Timestamp) -> bool {
        match self.status {
            JobStatus::Pending => self.scheduled_at <= now,
            JobStatus::Active => self.next_send_at.is_some_and(|at| at <= now),
            JobStatus::Completed | JobStatus::Cancelled => false,
        }
    }

    /// The fire time the recurrence calculator advances from.
    ///
    /// For a first fire this is `scheduled_at`; afterwards it is the due
    /// time itself, never "now", so recurring schedules do not drift.
    pub fn anchor(&self) -> Timestamp {
        self.next_send_at.unwrap_or(self.scheduled_at)
    }

    /// The channel-neutral message this campaign sends.
    pub fn message(&self) -> PushMessage {
        PushMessage {
            title: self.title.clone(),
            body: self.body.clone(),
            image_url: self.image_url.clone(),
            redirect: self.redirect.clone(),
            message_type: self.message_type.clone(),
        }
    }

    /// The targeting strategy in effect for this job.
    pub fn strategy(&self) -> TargetingStrategy<'_> {
        TargetingStrategy::select(&self.explicit_recipients, &self.phone_numbers, &self.filter)
    }

    /// Whether the job may still be deleted outright.
    ///
    /// Once any send has been recorded the campaign is execution history:
    /// it can be cancelled, never erased.
    pub fn is_deletable(&self) -> bool {
        self.total_sent == 0
    }
}

// ---------------------------------------------------------------------------
// Write DTOs
// ---------------------------------------------------------------------------

/// DTO for creating a job.
#[derive(Debug, Deserialize, Validate)]
pub struct NewJob {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 2000))]
    pub body: String,
    #[validate(url)]
    pub image_url: Option<String>,
    pub redirect: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub message_type: String,
    pub scheduled_at: Timestamp,
    pub frequency: Frequency,
    #[serde(default, deserialize_with = "deserialize_explicit_recipients")]
    pub explicit_recipients: ExplicitRecipients,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub filter: AttributeFilter,
    pub created_by: DbId,
}

impl NewJob {
    /// Full write-path validation: field bounds plus the targeting rule.
    ///
    /// A job with none of the three targeting inputs never reaches the
    /// scheduler; it is rejected here.
    pub fn validate_for_create(&self) -> Result<(), CoreError> {
        Validate::validate(self).map_err(|e| CoreError::Validation(e.to_string()))?;
        validate_targeting(&self.explicit_recipients, &self.phone_numbers, &self.filter)
    }
}

/// Wholesale replacement of a job's targeting inputs.
///
/// Targeting is updated as a unit (and re-validated) so a job can never be
/// edited into a no-strategy state.
#[derive(Debug, Deserialize)]
pub struct TargetingUpdate {
    #[serde(default, deserialize_with = "deserialize_explicit_recipients")]
    pub explicit_recipients: ExplicitRecipients,
    #[serde(default)]
    pub phone_numbers: Vec<String>,
    #[serde(default)]
    pub filter: AttributeFilter,
}

/// DTO for updating a job. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct JobUpdate {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub body: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub redirect: Option<String>,
    #[validate(length(min = 1, max = 64))]
    pub message_type: Option<String>,
    pub scheduled_at: Option<Timestamp>,
    pub frequency: Option<Frequency>,
    pub targeting: Option<TargetingUpdate>,
}

impl JobUpdate {
    /// Validate field bounds and, when targeting is replaced, the targeting
    /// rule.
    pub fn validate_for_update(&self) -> Result<(), CoreError> {
        Validate::validate(self).map_err(|e| CoreError::Validation(e.to_string()))?;
        if let Some(t) = &self.targeting {
            validate_targeting(&t.explicit_recipients, &t.phone_numbers, &t.filter)?;
        }
        Ok(())
    }
}
