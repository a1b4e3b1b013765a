//! The scheduler loop: claim due campaigns, run them, record outcomes.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use edupush_core::contracts::{JobStore, RunOutcome};
use edupush_core::job::NotificationJob;
use edupush_core::recurrence::next_fire;
use edupush_core::status::JobStatus;
use edupush_core::types::Timestamp;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::delivery::DeliveryEngine;
use crate::error::EngineError;
use crate::resolver::TargetResolver;

/// Long-lived scheduler task.
///
/// Each tick claims every due job under this instance's lease and runs the
/// claims concurrently, isolated from each other: one job's failure never
/// touches another's run. A failed run releases its lease untouched so the
/// job is retried on a later tick; a successful run is finalized through
/// [`JobStore::record_run`] in one atomic update.
pub struct Scheduler {
    store: Arc<dyn JobStore>,
    resolver: TargetResolver,
    engine: DeliveryEngine,
    instance_id: Uuid,
    poll_interval: Duration,
    lease: chrono::Duration,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn JobStore>,
        resolver: TargetResolver,
        engine: DeliveryEngine,
        poll_interval: Duration,
        lease: chrono::Duration,
    ) -> Self {
        Self {
            store,
            resolver,
            engine,
            instance_id: Uuid::new_v4(),
            poll_interval,
            lease,
        }
    }

    /// Run the scheduler loop until the cancellation token is triggered.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        tracing::info!(
            instance_id = %self.instance_id,
            poll_interval_secs = self.poll_interval.as_secs(),
            lease_secs = self.lease.num_seconds(),
            "Scheduler started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    self.tick(Utc::now()).await;
                }
            }
        }
    }

    /// One scheduler cycle at `now`. Returns the number of jobs claimed.
    pub async fn tick(&self, now: Timestamp) -> usize {
        let claimed = match self.store.claim_due(self.instance_id, now, self.lease).await {
            Ok(jobs) => jobs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to claim due jobs");
                return 0;
            }
        };
        if claimed.is_empty() {
            return 0;
        }

        let count = claimed.len();
        tracing::debug!(count, "Claimed due jobs");
        futures::future::join_all(claimed.into_iter().map(|job| self.run_job(job, now))).await;
        count
    }

    async fn run_job(&self, job: NotificationJob, now: Timestamp) {
        let job_id = job.id;
        match self.execute_job(&job, now).await {
            Ok(outcome) => {
                tracing::info!(
                    job_id,
                    sent = outcome.sent_delta,
                    failed = outcome.failed_delta,
                    status = outcome.status.as_str(),
                    next_send_at = ?outcome.next_send_at,
                    "Job run recorded",
                );
                if let Err(e) = self.store.record_run(job_id, &outcome).await {
                    tracing::error!(job_id, error = %e, "Failed to record job run");
                }
            }
            Err(e) => {
                tracing::error!(job_id, error = %e, "Job run failed, releasing lease for retry");
                if let Err(e) = self.store.release_lease(job_id, self.instance_id).await {
                    tracing::error!(job_id, error = %e, "Failed to release lease");
                }
            }
        }
    }

    /// Resolve, deliver, and compute the job's next lifecycle step.
    ///
    /// The next fire time advances from the job's anchor (the fire time
    /// that was due), never from `now`, so recurring schedules do not
    /// drift; a job far behind schedule catches up one interval per tick.
    async fn execute_job(
        &self,
        job: &NotificationJob,
        now: Timestamp,
    ) -> Result<RunOutcome, EngineError> {
        let recipients = self
            .resolver
            .resolve(job)
            .await
            .map_err(EngineError::Resolve)?;
        let report = self
            .engine
            .execute(&job.message(), &recipients, Some(job.id))
            .await?;

        let (next_send_at, status) = match next_fire(job.anchor(), job.frequency) {
            Some(next) => (Some(next), JobStatus::Active),
            None => (None, JobStatus::Completed),
        };

        Ok(RunOutcome {
            sent_delta: report.sent_delta(),
            failed_delta: report.failed_delta(),
            fired_at: now,
            next_send_at,
            status,
        })
    }
}
