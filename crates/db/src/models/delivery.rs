use chrono::{DateTime, Utc};
use edupush_core::types::DbId;

/// Raw `delivery_records` row. One row per (recipient, send attempt);
/// `job_id` is nullable so records outlive a deleted campaign.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryRecordRow {
    pub id: DbId,
    pub recipient_id: DbId,
    pub title: String,
    pub body: String,
    pub message_type: String,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub job_id: Option<DbId>,
    pub created_at: DateTime<Utc>,
}
