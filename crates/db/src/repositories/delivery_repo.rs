//! Append-only per-recipient delivery history.

use edupush_core::contracts::DeliveryEntry;
use edupush_core::types::DbId;
use sqlx::PgPool;

use crate::error::StoreError;
use crate::models::DeliveryRecordRow;

pub struct DeliveryRepo;

impl DeliveryRepo {
    /// Insert one history row per entry in a single UNNEST statement.
    /// Records are written before any push attempt, so in-app history is
    /// complete even when every push fails.
    pub async fn append_batch(pool: &PgPool, entries: &[DeliveryEntry]) -> Result<u64, StoreError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut recipient_ids = Vec::with_capacity(entries.len());
        let mut titles = Vec::with_capacity(entries.len());
        let mut bodies = Vec::with_capacity(entries.len());
        let mut message_types = Vec::with_capacity(entries.len());
        let mut job_ids: Vec<Option<DbId>> = Vec::with_capacity(entries.len());
        for entry in entries {
            recipient_ids.push(entry.recipient_id);
            titles.push(entry.title.as_str());
            bodies.push(entry.body.as_str());
            message_types.push(entry.message_type.as_str());
            job_ids.push(entry.job_id);
        }

        let result = sqlx::query(
            "INSERT INTO delivery_records (recipient_id, title, body, message_type, job_id) \
             SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::text[], $4::text[], $5::bigint[])",
        )
        .bind(&recipient_ids)
        .bind(&titles)
        .bind(&bodies)
        .bind(&message_types)
        .bind(&job_ids)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Most recent history for one recipient, newest first.
    pub async fn recent_for_recipient(
        pool: &PgPool,
        recipient_id: DbId,
        limit: i64,
    ) -> Result<Vec<DeliveryRecordRow>, StoreError> {
        let rows = sqlx::query_as(
            "SELECT id, recipient_id, title, body, message_type, is_read, read_at, job_id, \
                    created_at \
             FROM delivery_records \
             WHERE recipient_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2",
        )
        .bind(recipient_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;
        Ok(rows)
    }

    /// Mark one record read, scoped to its owner.
    pub async fn mark_read(pool: &PgPool, id: DbId, recipient_id: DbId) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE delivery_records SET is_read = TRUE, read_at = NOW() \
             WHERE id = $1 AND recipient_id = $2",
        )
        .bind(id)
        .bind(recipient_id)
        .execute(pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
