//! Collaborator contracts consumed by the delivery engine.
//!
//! The engine is written against these traits. `edupush-db` provides the
//! Postgres-backed implementations; tests substitute in-memory fakes. The
//! engine must not assume more than what these contracts state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CoreError;
use crate::job::NotificationJob;
use crate::status::JobStatus;
use crate::targeting::AttributeFilter;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Supporting types
// ---------------------------------------------------------------------------

/// Per-recipient push addresses as returned by the directory.
///
/// A recipient with neither address is delivery-record-only: in-app history
/// exists but no push is attempted, and that is not a failure.
#[derive(Debug, Clone, Default)]
pub struct RecipientAddresses {
    pub recipient_id: DbId,
    /// Current-device Expo token (the 1:1 rotating slot on the recipient's
    /// own record).
    pub expo_token: Option<String>,
    /// Active FCM registration tokens (zero or more per recipient).
    pub fcm_tokens: Vec<String>,
}

/// One in-app history row, written before any push attempt so that
/// recipient-facing history stays accurate under partial push failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryEntry {
    pub recipient_id: DbId,
    pub title: String,
    pub body: String,
    pub message_type: String,
    /// Back-reference to the originating job; `None` for one-shot sends.
    pub job_id: Option<DbId>,
}

/// Outcome of one delivery run, applied to the owning job in a single
/// atomic store update.
#[derive(Debug, Clone, Copy)]
pub struct RunOutcome {
    /// Additive increment for `total_sent` (channel attempts, not unique
    /// recipients).
    pub sent_delta: i64,
    /// Additive increment for `total_failed`.
    pub failed_delta: i64,
    pub fired_at: Timestamp,
    /// `None` for ONCE jobs; the anchored next fire time otherwise.
    pub next_send_at: Option<Timestamp>,
    pub status: JobStatus,
}

// ---------------------------------------------------------------------------
// Contracts
// ---------------------------------------------------------------------------

/// Read-only user directory. Knows nothing about campaigns.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Active recipients matching a conjunctive attribute filter. An empty
    /// filter matches every active recipient (the broadcast path).
    async fn find_active(&self, filter: &AttributeFilter) -> Result<Vec<DbId>, CoreError>;

    /// The subset of `ids` that exist in the directory, active or not.
    /// Explicit targeting bypasses the active check by design.
    async fn find_existing(&self, ids: &[DbId]) -> Result<Vec<DbId>, CoreError>;

    /// Active recipients matching any of the given contact numbers.
    async fn find_by_contact(&self, numbers: &[String]) -> Result<Vec<DbId>, CoreError>;

    /// Push addresses for the given recipients, partitioned by channel.
    async fn find_addresses(&self, ids: &[DbId]) -> Result<Vec<RecipientAddresses>, CoreError>;
}

/// Durable campaign state, as seen by the scheduler.
///
/// Operator-facing CRUD lives on the repository layer; the scheduler only
/// claims, finalizes, and releases.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Atomically claim every due job, stamping `owner` as lease holder
    /// until `now + lease`. A job already under an unexpired lease is not
    /// returned, so at most one scheduler instance executes it per tick.
    async fn claim_due(
        &self,
        owner: Uuid,
        now: Timestamp,
        lease: chrono::Duration,
    ) -> Result<Vec<NotificationJob>, CoreError>;

    /// Apply a run outcome: additive counter increments, lifecycle advance,
    /// lease release. Never a read-modify-write on the counters.
    async fn record_run(&self, job_id: DbId, outcome: &RunOutcome) -> Result<(), CoreError>;

    /// Release a lease after a failed run, leaving status and counters
    /// untouched so the job is retried on the next tick.
    async fn release_lease(&self, job_id: DbId, owner: Uuid) -> Result<(), CoreError>;
}

/// Append-only sink for per-recipient delivery history.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn append(&self, entries: &[DeliveryEntry]) -> Result<(), CoreError>;
}
