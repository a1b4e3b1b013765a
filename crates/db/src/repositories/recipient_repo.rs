//! Directory queries over `recipients` and the `fcm_tokens` registry.

use std::collections::HashMap;

use edupush_core::contracts::RecipientAddresses;
use edupush_core::targeting::AttributeFilter;
use edupush_core::types::DbId;
use sqlx::PgPool;

use crate::error::StoreError;

pub struct RecipientRepo;

impl RecipientRepo {
    /// Active recipients matching a conjunctive attribute filter. An unset
    /// key never narrows the result, so the empty filter is the broadcast
    /// query.
    pub async fn find_active(
        pool: &PgPool,
        filter: &AttributeFilter,
    ) -> Result<Vec<DbId>, StoreError> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM recipients \
             WHERE is_active \
               AND ($1::text IS NULL OR institution = $1) \
               AND ($2::text IS NULL OR program = $2) \
               AND ($3::text IS NULL OR stage = $3) \
               AND ($4::text IS NULL OR language = $4) \
             ORDER BY id",
        )
        .bind(filter.institution.as_deref())
        .bind(filter.program.as_deref())
        .bind(filter.stage.as_deref())
        .bind(filter.language.as_deref())
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }

    /// The subset of `ids` present in the directory, active or not.
    pub async fn find_existing(pool: &PgPool, ids: &[DbId]) -> Result<Vec<DbId>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids = sqlx::query_scalar("SELECT id FROM recipients WHERE id = ANY($1) ORDER BY id")
            .bind(ids)
            .fetch_all(pool)
            .await?;
        Ok(ids)
    }

    /// Active recipients matching any of the given contact numbers.
    pub async fn find_by_contact(
        pool: &PgPool,
        numbers: &[String],
    ) -> Result<Vec<DbId>, StoreError> {
        if numbers.is_empty() {
            return Ok(Vec::new());
        }
        let ids = sqlx::query_scalar(
            "SELECT id FROM recipients \
             WHERE is_active AND contact_number = ANY($1) \
             ORDER BY id",
        )
        .bind(numbers)
        .fetch_all(pool)
        .await?;
        Ok(ids)
    }

    /// Push addresses for the given recipients: the rotating Expo slot off
    /// the recipient row plus every active FCM registration.
    pub async fn find_addresses(
        pool: &PgPool,
        ids: &[DbId],
    ) -> Result<Vec<RecipientAddresses>, StoreError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let slots: Vec<(DbId, Option<String>)> =
            sqlx::query_as("SELECT id, expo_token FROM recipients WHERE id = ANY($1) ORDER BY id")
                .bind(ids)
                .fetch_all(pool)
                .await?;

        let registrations: Vec<(DbId, String)> = sqlx::query_as(
            "SELECT recipient_id, token FROM fcm_tokens \
             WHERE recipient_id = ANY($1) AND is_active \
             ORDER BY id",
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        let mut fcm_by_recipient: HashMap<DbId, Vec<String>> = HashMap::new();
        for (recipient_id, token) in registrations {
            fcm_by_recipient.entry(recipient_id).or_default().push(token);
        }

        Ok(slots
            .into_iter()
            .map(|(recipient_id, expo_token)| RecipientAddresses {
                recipient_id,
                expo_token,
                fcm_tokens: fcm_by_recipient.remove(&recipient_id).unwrap_or_default(),
            })
            .collect())
    }

    /// Overwrite the recipient's Expo slot. Each app login rotates the
    /// token; `None` clears it on logout.
    pub async fn set_expo_token(
        pool: &PgPool,
        recipient_id: DbId,
        token: Option<&str>,
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query("UPDATE recipients SET expo_token = $2, updated_at = NOW() WHERE id = $1")
                .bind(recipient_id)
                .bind(token)
                .execute(pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(recipient_id));
        }
        Ok(())
    }

    /// Register (or re-activate) an FCM token for a device. Registrations
    /// accumulate per recipient rather than rotating.
    pub async fn register_fcm_token(
        pool: &PgPool,
        recipient_id: DbId,
        token: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO fcm_tokens (recipient_id, token) VALUES ($1, $2) \
             ON CONFLICT (recipient_id, token) DO UPDATE SET is_active = TRUE",
        )
        .bind(recipient_id)
        .bind(token)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Deactivate a registration reported dead by the push service.
    pub async fn revoke_fcm_token(
        pool: &PgPool,
        recipient_id: DbId,
        token: &str,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE fcm_tokens SET is_active = FALSE WHERE recipient_id = $1 AND token = $2",
        )
        .bind(recipient_id)
        .bind(token)
        .execute(pool)
        .await?;
        Ok(())
    }
}
