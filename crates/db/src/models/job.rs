use chrono::{DateTime, Utc};
use edupush_core::job::NotificationJob;
use edupush_core::recurrence::Frequency;
use edupush_core::status::JobStatus;
use edupush_core::targeting::{AttributeFilter, ExplicitRecipients};
use edupush_core::types::DbId;
use serde_json::Value;
use uuid::Uuid;

use crate::error::StoreError;

/// Raw `notification_jobs` row.
///
/// Enum-valued columns stay as TEXT/JSONB here and are decoded into the
/// domain types in [`JobRow::into_domain`]; lease columns are scheduler
/// bookkeeping and never leave this layer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: DbId,
    pub title: String,
    pub body: String,
    pub image_url: Option<String>,
    pub redirect: Option<String>,
    pub message_type: String,
    pub scheduled_at: DateTime<Utc>,
    pub frequency: String,
    pub next_send_at: Option<DateTime<Utc>>,
    pub explicit_recipients: Option<Value>,
    pub phone_numbers: Vec<String>,
    pub attribute_filter: Value,
    pub status: String,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub total_sent: i64,
    pub total_failed: i64,
    pub lease_owner: Option<Uuid>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub created_by: DbId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRow {
    pub fn into_domain(self) -> Result<NotificationJob, StoreError> {
        let id = self.id;
        let corrupt = |detail: String| StoreError::Corrupt { id, detail };

        let frequency = self
            .frequency
            .parse::<Frequency>()
            .map_err(|e| corrupt(e.to_string()))?;
        let status = self
            .status
            .parse::<JobStatus>()
            .map_err(|e| corrupt(e.to_string()))?;
        let explicit_recipients = ExplicitRecipients::from_column(self.explicit_recipients.as_ref())
            .map_err(|e| corrupt(e.to_string()))?;
        let filter: AttributeFilter = serde_json::from_value(self.attribute_filter)
            .map_err(|e| corrupt(format!("attribute_filter: {e}")))?;

        Ok(NotificationJob {
            id: self.id,
            title: self.title,
            body: self.body,
            image_url: self.image_url,
            redirect: self.redirect,
            message_type: self.message_type,
            scheduled_at: self.scheduled_at,
            frequency,
            next_send_at: self.next_send_at,
            explicit_recipients,
            phone_numbers: self.phone_numbers,
            filter,
            status,
            last_sent_at: self.last_sent_at,
            total_sent: self.total_sent,
            total_failed: self.total_failed,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row() -> JobRow {
        JobRow {
            id: 1,
            title: "Exam Timetable".to_string(),
            body: "Timetable published".to_string(),
            image_url: None,
            redirect: None,
            message_type: "exam".to_string(),
            scheduled_at: Utc::now(),
            frequency: "DAILY".to_string(),
            next_send_at: None,
            explicit_recipients: None,
            phone_numbers: vec![],
            attribute_filter: json!({ "language": "en" }),
            status: "PENDING".to_string(),
            last_sent_at: None,
            total_sent: 0,
            total_failed: 0,
            lease_owner: None,
            lease_expires_at: None,
            created_by: 9,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn decodes_enums_and_targeting_columns() {
        let mut r = row();
        r.explicit_recipients = Some(json!([3, 5]));

        let job = r.into_domain().unwrap();
        assert_eq!(job.frequency, Frequency::Daily);
        assert_eq!(job.status, JobStatus::Pending);
        assert_eq!(job.explicit_recipients, ExplicitRecipients::Specific(vec![3, 5]));
        assert_eq!(job.filter.language.as_deref(), Some("en"));
    }

    #[test]
    fn null_json_column_decodes_as_broadcast() {
        let mut r = row();
        r.explicit_recipients = Some(Value::Null);

        let job = r.into_domain().unwrap();
        assert_eq!(job.explicit_recipients, ExplicitRecipients::Broadcast);
    }

    #[test]
    fn absent_column_decodes_as_not_set() {
        let job = row().into_domain().unwrap();
        assert_eq!(job.explicit_recipients, ExplicitRecipients::NotSet);
    }

    #[test]
    fn unknown_status_is_reported_as_corruption() {
        let mut r = row();
        r.status = "PAUSED".to_string();

        let err = r.into_domain().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { id: 1, .. }));
    }

    #[test]
    fn unknown_frequency_is_reported_as_corruption() {
        let mut r = row();
        r.frequency = "FORTNIGHTLY".to_string();

        assert!(matches!(r.into_domain().unwrap_err(), StoreError::Corrupt { .. }));
    }
}
