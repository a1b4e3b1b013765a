//! Postgres adapter for the engine's collaborator contracts.

use async_trait::async_trait;
use chrono::Duration;
use edupush_core::contracts::{
    DeliveryEntry, DeliverySink, Directory, JobStore, RecipientAddresses, RunOutcome,
};
use edupush_core::error::CoreError;
use edupush_core::job::NotificationJob;
use edupush_core::targeting::AttributeFilter;
use edupush_core::types::{DbId, Timestamp};
use uuid::Uuid;

use crate::repositories::{DeliveryRepo, JobRepo, RecipientRepo};
use crate::DbPool;

/// One `PgBackend` serves as directory, job store, and delivery sink; the
/// engine holds it behind the individual trait objects.
#[derive(Clone)]
pub struct PgBackend {
    pool: DbPool,
}

impl PgBackend {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Directory for PgBackend {
    async fn find_active(&self, filter: &AttributeFilter) -> Result<Vec<DbId>, CoreError> {
        Ok(RecipientRepo::find_active(&self.pool, filter).await?)
    }

    async fn find_existing(&self, ids: &[DbId]) -> Result<Vec<DbId>, CoreError> {
        Ok(RecipientRepo::find_existing(&self.pool, ids).await?)
    }

    async fn find_by_contact(&self, numbers: &[String]) -> Result<Vec<DbId>, CoreError> {
        Ok(RecipientRepo::find_by_contact(&self.pool, numbers).await?)
    }

    async fn find_addresses(&self, ids: &[DbId]) -> Result<Vec<RecipientAddresses>, CoreError> {
        Ok(RecipientRepo::find_addresses(&self.pool, ids).await?)
    }
}

#[async_trait]
impl JobStore for PgBackend {
    async fn claim_due(
        &self,
        owner: Uuid,
        now: Timestamp,
        lease: Duration,
    ) -> Result<Vec<NotificationJob>, CoreError> {
        Ok(JobRepo::claim_due(&self.pool, owner, now, lease).await?)
    }

    async fn record_run(&self, job_id: DbId, outcome: &RunOutcome) -> Result<(), CoreError> {
        Ok(JobRepo::record_run(&self.pool, job_id, outcome).await?)
    }

    async fn release_lease(&self, job_id: DbId, owner: Uuid) -> Result<(), CoreError> {
        Ok(JobRepo::release_lease(&self.pool, job_id, owner).await?)
    }
}

#[async_trait]
impl DeliverySink for PgBackend {
    async fn append(&self, entries: &[DeliveryEntry]) -> Result<(), CoreError> {
        DeliveryRepo::append_batch(&self.pool, entries).await?;
        Ok(())
    }
}
