//! In-memory collaborator fakes shared by the engine scenario tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use edupush_channels::outcome::{DispatchFailure, DispatchOutcome};
use edupush_channels::ChannelDispatcher;
use edupush_core::contracts::{
    DeliveryEntry, DeliverySink, Directory, JobStore, RecipientAddresses, RunOutcome,
};
use edupush_core::error::CoreError;
use edupush_core::job::NotificationJob;
use edupush_core::message::PushMessage;
use edupush_core::recurrence::Frequency;
use edupush_core::status::JobStatus;
use edupush_core::targeting::{AttributeFilter, ExplicitRecipients};
use edupush_core::types::{DbId, Timestamp};
use edupush_engine::delivery::DeliveryEngine;
use edupush_engine::resolver::TargetResolver;
use edupush_engine::scheduler::Scheduler;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Directory fake
// ---------------------------------------------------------------------------

pub struct TestRecipient {
    pub id: DbId,
    pub active: bool,
    pub language: Option<String>,
    pub institution: Option<String>,
    pub program: Option<String>,
    pub stage: Option<String>,
    pub contact_number: Option<String>,
    pub expo_token: Option<String>,
    pub fcm_tokens: Vec<String>,
}

impl TestRecipient {
    pub fn new(id: DbId) -> Self {
        TestRecipient {
            id,
            active: true,
            language: None,
            institution: None,
            program: None,
            stage: None,
            contact_number: None,
            expo_token: None,
            fcm_tokens: Vec::new(),
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn language(mut self, language: &str) -> Self {
        self.language = Some(language.to_string());
        self
    }

    pub fn contact(mut self, number: &str) -> Self {
        self.contact_number = Some(number.to_string());
        self
    }

    pub fn expo(mut self, token: &str) -> Self {
        self.expo_token = Some(token.to_string());
        self
    }

    pub fn fcm(mut self, token: &str) -> Self {
        self.fcm_tokens.push(token.to_string());
        self
    }
}

#[derive(Default)]
pub struct InMemoryDirectory {
    pub recipients: Vec<TestRecipient>,
    /// Simulate a directory outage on the contact-number lookup.
    pub fail_contact_lookup: bool,
    /// Simulate a directory outage on the address lookup.
    pub fail_addresses: bool,
}

impl InMemoryDirectory {
    pub fn with_recipients(recipients: Vec<TestRecipient>) -> Self {
        InMemoryDirectory {
            recipients,
            ..InMemoryDirectory::default()
        }
    }

    fn matches(recipient: &TestRecipient, filter: &AttributeFilter) -> bool {
        fn key_matches(required: &Option<String>, actual: &Option<String>) -> bool {
            match required {
                None => true,
                Some(v) => actual.as_deref() == Some(v.as_str()),
            }
        }
        key_matches(&filter.institution, &recipient.institution)
            && key_matches(&filter.program, &recipient.program)
            && key_matches(&filter.stage, &recipient.stage)
            && key_matches(&filter.language, &recipient.language)
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_active(&self, filter: &AttributeFilter) -> Result<Vec<DbId>, CoreError> {
        Ok(self
            .recipients
            .iter()
            .filter(|r| r.active && Self::matches(r, filter))
            .map(|r| r.id)
            .collect())
    }

    async fn find_existing(&self, ids: &[DbId]) -> Result<Vec<DbId>, CoreError> {
        Ok(self
            .recipients
            .iter()
            .filter(|r| ids.contains(&r.id))
            .map(|r| r.id)
            .collect())
    }

    async fn find_by_contact(&self, numbers: &[String]) -> Result<Vec<DbId>, CoreError> {
        if self.fail_contact_lookup {
            return Err(CoreError::Internal("directory unavailable".to_string()));
        }
        Ok(self
            .recipients
            .iter()
            .filter(|r| {
                r.active
                    && r.contact_number
                        .as_ref()
                        .is_some_and(|n| numbers.contains(n))
            })
            .map(|r| r.id)
            .collect())
    }

    async fn find_addresses(&self, ids: &[DbId]) -> Result<Vec<RecipientAddresses>, CoreError> {
        if self.fail_addresses {
            return Err(CoreError::Internal("directory unavailable".to_string()));
        }
        Ok(self
            .recipients
            .iter()
            .filter(|r| ids.contains(&r.id))
            .map(|r| RecipientAddresses {
                recipient_id: r.id,
                expo_token: r.expo_token.clone(),
                fcm_tokens: r.fcm_tokens.clone(),
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Job store fake
// ---------------------------------------------------------------------------

/// Mirrors the store semantics the scheduler relies on: the due predicate,
/// lease exclusion, additive counters, and owner-scoped release.
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<Vec<NotificationJob>>,
    leases: Mutex<HashMap<DbId, (Uuid, Timestamp)>>,
    pub recorded: Mutex<Vec<(DbId, RunOutcome)>>,
    pub released: Mutex<Vec<DbId>>,
}

impl InMemoryJobStore {
    pub fn with_jobs(jobs: Vec<NotificationJob>) -> Self {
        InMemoryJobStore {
            jobs: Mutex::new(jobs),
            ..InMemoryJobStore::default()
        }
    }

    pub fn job(&self, id: DbId) -> NotificationJob {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id)
            .expect("job not in store")
            .clone()
    }

    pub fn set_lease(&self, id: DbId, owner: Uuid, until: Timestamp) {
        self.leases.lock().unwrap().insert(id, (owner, until));
    }

    pub fn lease(&self, id: DbId) -> Option<(Uuid, Timestamp)> {
        self.leases.lock().unwrap().get(&id).copied()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn claim_due(
        &self,
        owner: Uuid,
        now: Timestamp,
        lease: chrono::Duration,
    ) -> Result<Vec<NotificationJob>, CoreError> {
        let jobs = self.jobs.lock().unwrap();
        let mut leases = self.leases.lock().unwrap();
        let mut claimed = Vec::new();
        for job in jobs.iter() {
            if !job.is_due(now) {
                continue;
            }
            if leases.get(&job.id).is_some_and(|(_, until)| *until > now) {
                continue;
            }
            leases.insert(job.id, (owner, now + lease));
            claimed.push(job.clone());
        }
        Ok(claimed)
    }

    async fn record_run(&self, job_id: DbId, outcome: &RunOutcome) -> Result<(), CoreError> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(CoreError::NotFound {
                entity: "notification_job",
                id: job_id,
            })?;
        // Terminal states win over an in-flight run's outcome.
        if !job.status.can_transition(outcome.status) {
            return Ok(());
        }
        job.total_sent += outcome.sent_delta;
        job.total_failed += outcome.failed_delta;
        job.last_sent_at = Some(outcome.fired_at);
        job.next_send_at = outcome.next_send_at;
        job.status = outcome.status;
        self.leases.lock().unwrap().remove(&job_id);
        self.recorded.lock().unwrap().push((job_id, *outcome));
        Ok(())
    }

    async fn release_lease(&self, job_id: DbId, owner: Uuid) -> Result<(), CoreError> {
        let mut leases = self.leases.lock().unwrap();
        if leases.get(&job_id).is_some_and(|(o, _)| *o == owner) {
            leases.remove(&job_id);
        }
        self.released.lock().unwrap().push(job_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Sink and dispatcher fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingSink {
    pub entries: Mutex<Vec<DeliveryEntry>>,
    pub fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        RecordingSink {
            fail: true,
            ..RecordingSink::default()
        }
    }
}

#[async_trait]
impl DeliverySink for RecordingSink {
    async fn append(&self, entries: &[DeliveryEntry]) -> Result<(), CoreError> {
        if self.fail {
            return Err(CoreError::Internal("history write failed".to_string()));
        }
        self.entries.lock().unwrap().extend_from_slice(entries);
        Ok(())
    }
}

pub struct FakeDispatcher {
    name: &'static str,
    failing: HashSet<String>,
    pub dispatched: Mutex<Vec<String>>,
}

impl FakeDispatcher {
    pub fn new(name: &'static str) -> Self {
        Self::failing_tokens(name, &[])
    }

    pub fn failing_tokens(name: &'static str, tokens: &[&str]) -> Self {
        FakeDispatcher {
            name,
            failing: tokens.iter().map(|s| s.to_string()).collect(),
            dispatched: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChannelDispatcher for FakeDispatcher {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn dispatch(&self, tokens: &[String], _message: &PushMessage) -> DispatchOutcome {
        self.dispatched.lock().unwrap().extend(tokens.iter().cloned());
        let mut outcome = DispatchOutcome::default();
        for token in tokens {
            if self.failing.contains(token) {
                outcome.failures.push(DispatchFailure {
                    token: token.clone(),
                    reason: "DeviceNotRegistered".to_string(),
                });
            } else {
                outcome.success_count += 1;
            }
        }
        outcome
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Wires the fakes into a scheduler the way `main` wires the real backend.
pub struct Harness {
    pub directory: Arc<InMemoryDirectory>,
    pub store: Arc<InMemoryJobStore>,
    pub sink: Arc<RecordingSink>,
    pub expo: Arc<FakeDispatcher>,
    pub fcm: Arc<FakeDispatcher>,
    pub scheduler: Scheduler,
}

impl Harness {
    pub fn new(
        directory: InMemoryDirectory,
        store: InMemoryJobStore,
        sink: RecordingSink,
        expo: FakeDispatcher,
        fcm: FakeDispatcher,
    ) -> Self {
        let directory = Arc::new(directory);
        let store = Arc::new(store);
        let sink = Arc::new(sink);
        let expo = Arc::new(expo);
        let fcm = Arc::new(fcm);

        let engine = DeliveryEngine::new(
            directory.clone(),
            sink.clone(),
            expo.clone(),
            fcm.clone(),
        );
        let scheduler = Scheduler::new(
            store.clone(),
            TargetResolver::new(directory.clone()),
            engine,
            Duration::from_secs(60),
            chrono::Duration::seconds(300),
        );

        Harness {
            directory,
            store,
            sink,
            expo,
            fcm,
            scheduler,
        }
    }
}

// ---------------------------------------------------------------------------
// Job builder
// ---------------------------------------------------------------------------

pub fn job(id: DbId, frequency: Frequency, scheduled_at: Timestamp) -> NotificationJob {
    NotificationJob {
        id,
        title: format!("Campaign {id}"),
        body: "Body".to_string(),
        image_url: None,
        redirect: None,
        message_type: "announcement".to_string(),
        scheduled_at,
        frequency,
        next_send_at: None,
        explicit_recipients: ExplicitRecipients::Broadcast,
        phone_numbers: Vec::new(),
        filter: AttributeFilter::default(),
        status: JobStatus::Pending,
        last_sent_at: None,
        total_sent: 0,
        total_failed: 0,
        created_by: 1,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
