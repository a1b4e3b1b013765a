//! CRUD and scheduler-side operations on `notification_jobs`.

use chrono::{DateTime, Utc};
use edupush_core::contracts::RunOutcome;
use edupush_core::job::{JobUpdate, NewJob, NotificationJob};
use edupush_core::status::JobStatus;
use edupush_core::types::DbId;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::JobRow;

const COLUMNS: &str = "id, title, body, image_url, redirect, message_type, scheduled_at, \
     frequency, next_send_at, explicit_recipients, phone_numbers, attribute_filter, status, \
     last_sent_at, total_sent, total_failed, lease_owner, lease_expires_at, created_by, \
     created_at, updated_at";

const DEFAULT_LIMIT: i64 = 50;
const MAX_LIMIT: i64 = 200;

pub struct JobRepo;

impl JobRepo {
    /// Create a job. New jobs always start as PENDING with empty counters;
    /// targeting is validated before anything touches the database.
    pub async fn create(pool: &PgPool, input: &NewJob) -> Result<NotificationJob, StoreError> {
        input.validate_for_create()?;
        let filter = serde_json::to_value(&input.filter)?;

        let row: JobRow = sqlx::query_as(&format!(
            "INSERT INTO notification_jobs \
             (title, body, image_url, redirect, message_type, scheduled_at, frequency, \
              explicit_recipients, phone_numbers, attribute_filter, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        ))
        .bind(&input.title)
        .bind(&input.body)
        .bind(&input.image_url)
        .bind(&input.redirect)
        .bind(&input.message_type)
        .bind(input.scheduled_at)
        .bind(input.frequency.as_str())
        .bind(input.explicit_recipients.to_column())
        .bind(&input.phone_numbers)
        .bind(filter)
        .bind(input.created_by)
        .fetch_one(pool)
        .await?;

        row.into_domain()
    }

    pub async fn get(pool: &PgPool, id: DbId) -> Result<Option<NotificationJob>, StoreError> {
        let row: Option<JobRow> =
            sqlx::query_as(&format!("SELECT {COLUMNS} FROM notification_jobs WHERE id = $1"))
                .bind(id)
                .fetch_optional(pool)
                .await?;
        row.map(JobRow::into_domain).transpose()
    }

    pub async fn list(
        pool: &PgPool,
        status: Option<JobStatus>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<NotificationJob>, StoreError> {
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
        let offset = offset.unwrap_or(0).max(0);

        let rows: Vec<JobRow> = sqlx::query_as(&format!(
            "SELECT {COLUMNS} FROM notification_jobs \
             WHERE ($1::text IS NULL OR status = $1) \
             ORDER BY created_at DESC \
             LIMIT $2 OFFSET $3"
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(JobRow::into_domain).collect()
    }

    /// Patch content, schedule, or targeting. Targeting is replaced as a
    /// unit when present, so a job cannot be edited into a no-strategy
    /// state. Status, counters, and lease columns are never touched here.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        patch: &JobUpdate,
    ) -> Result<NotificationJob, StoreError> {
        patch.validate_for_update()?;
        let current = Self::get(pool, id).await?.ok_or(StoreError::NotFound(id))?;

        let title = patch.title.clone().unwrap_or(current.title);
        let body = patch.body.clone().unwrap_or(current.body);
        let image_url = patch.image_url.clone().or(current.image_url);
        let redirect = patch.redirect.clone().or(current.redirect);
        let message_type = patch.message_type.clone().unwrap_or(current.message_type);
        let scheduled_at = patch.scheduled_at.unwrap_or(current.scheduled_at);
        let frequency = patch.frequency.unwrap_or(current.frequency);
        let (explicit, phone_numbers, filter) = match &patch.targeting {
            Some(t) => (
                t.explicit_recipients.clone(),
                t.phone_numbers.clone(),
                t.filter.clone(),
            ),
            None => (current.explicit_recipients, current.phone_numbers, current.filter),
        };
        let filter = serde_json::to_value(&filter)?;

        let row: JobRow = sqlx::query_as(&format!(
            "UPDATE notification_jobs \
             SET title = $2, body = $3, image_url = $4, redirect = $5, message_type = $6, \
                 scheduled_at = $7, frequency = $8, explicit_recipients = $9, \
                 phone_numbers = $10, attribute_filter = $11, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&title)
        .bind(&body)
        .bind(&image_url)
        .bind(&redirect)
        .bind(&message_type)
        .bind(scheduled_at)
        .bind(frequency.as_str())
        .bind(explicit.to_column())
        .bind(&phone_numbers)
        .bind(filter)
        .fetch_one(pool)
        .await?;

        row.into_domain()
    }

    /// Cancel a PENDING or ACTIVE job. Cancellation clears `next_send_at`
    /// so the due predicate can never match again; cancelling a terminal
    /// job is a conflict, not a no-op.
    pub async fn cancel(pool: &PgPool, id: DbId) -> Result<NotificationJob, StoreError> {
        let row: Option<JobRow> = sqlx::query_as(&format!(
            "UPDATE notification_jobs \
             SET status = 'CANCELLED', next_send_at = NULL, \
                 lease_owner = NULL, lease_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status IN ('PENDING', 'ACTIVE') \
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match row {
            Some(row) => row.into_domain(),
            None => match Self::get(pool, id).await? {
                Some(job) => {
                    job.status.validate_transition(JobStatus::Cancelled)?;
                    Err(StoreError::Terminal(id))
                }
                None => Err(StoreError::NotFound(id)),
            },
        }
    }

    /// Delete a job that has never sent anything. Once `total_sent` is
    /// non-zero the campaign is execution history and can only be
    /// cancelled.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<(), StoreError> {
        let job = Self::get(pool, id).await?.ok_or(StoreError::NotFound(id))?;
        if !job.is_deletable() {
            return Err(StoreError::Immutable(id));
        }

        // The guard is repeated in SQL so a run landing between the read
        // and the delete cannot erase history.
        let deleted: Option<DbId> = sqlx::query_scalar(
            "DELETE FROM notification_jobs WHERE id = $1 AND total_sent = 0 RETURNING id",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match deleted {
            Some(_) => Ok(()),
            None => Err(StoreError::Immutable(id)),
        }
    }

    /// Claim every due job for `owner`, stamping a lease until
    /// `now + lease`. `FOR UPDATE SKIP LOCKED` plus the lease predicate
    /// keeps concurrent scheduler instances from double-firing a job; an
    /// expired lease (crashed owner) is claimable again.
    pub async fn claim_due(
        pool: &PgPool,
        owner: Uuid,
        now: DateTime<Utc>,
        lease: chrono::Duration,
    ) -> Result<Vec<NotificationJob>, StoreError> {
        let rows: Vec<JobRow> = sqlx::query_as(&format!(
            "UPDATE notification_jobs \
             SET lease_owner = $1, lease_expires_at = $2, updated_at = NOW() \
             WHERE id IN ( \
                 SELECT id FROM notification_jobs \
                 WHERE ((status = 'PENDING' AND scheduled_at <= $3) \
                        OR (status = 'ACTIVE' AND next_send_at <= $3)) \
                   AND (lease_expires_at IS NULL OR lease_expires_at <= $3) \
                 ORDER BY id \
                 FOR UPDATE SKIP LOCKED \
             ) \
             RETURNING {COLUMNS}"
        ))
        .bind(owner)
        .bind(now + lease)
        .bind(now)
        .fetch_all(pool)
        .await?;

        rows.into_iter().map(JobRow::into_domain).collect()
    }

    /// Apply a run outcome in one statement: counters grow additively (no
    /// read-modify-write), the lifecycle advances, and the lease clears.
    ///
    /// The status predicate keeps terminal states terminal: a job cancelled
    /// while its run was in flight stays CANCELLED, and the outcome of that
    /// last run is dropped rather than resurrecting the campaign.
    pub async fn record_run(
        pool: &PgPool,
        job_id: DbId,
        outcome: &RunOutcome,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE notification_jobs \
             SET total_sent = total_sent + $2, total_failed = total_failed + $3, \
                 last_sent_at = $4, next_send_at = $5, status = $6, \
                 lease_owner = NULL, lease_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND status IN ('PENDING', 'ACTIVE')",
        )
        .bind(job_id)
        .bind(outcome.sent_delta)
        .bind(outcome.failed_delta)
        .bind(outcome.fired_at)
        .bind(outcome.next_send_at)
        .bind(outcome.status.as_str())
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return match Self::get(pool, job_id).await? {
                Some(job) => {
                    tracing::warn!(
                        job_id,
                        status = job.status.as_str(),
                        sent = outcome.sent_delta,
                        failed = outcome.failed_delta,
                        "Job reached a terminal state mid-run, outcome dropped"
                    );
                    Ok(())
                }
                None => Err(StoreError::NotFound(job_id)),
            };
        }
        Ok(())
    }

    /// Drop a lease after a failed run without touching status or
    /// counters, so the job is retried on a later tick. Scoped to `owner`:
    /// a stale instance cannot release someone else's claim.
    pub async fn release_lease(pool: &PgPool, job_id: DbId, owner: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE notification_jobs \
             SET lease_owner = NULL, lease_expires_at = NULL, updated_at = NOW() \
             WHERE id = $1 AND lease_owner = $2",
        )
        .bind(job_id)
        .bind(owner)
        .execute(pool)
        .await?;
        Ok(())
    }
}
