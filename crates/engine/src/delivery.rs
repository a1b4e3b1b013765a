//! One delivery run: history records first, then parallel channel fan-out.

use std::sync::Arc;

use edupush_channels::outcome::DispatchOutcome;
use edupush_channels::ChannelDispatcher;
use edupush_core::contracts::{DeliveryEntry, DeliverySink, Directory};
use edupush_core::message::PushMessage;
use edupush_core::types::DbId;

use crate::error::EngineError;
use crate::registry::ChannelBatches;

/// Aggregated result of one delivery run.
#[derive(Debug, Default)]
pub struct DeliveryReport {
    /// Recipients the run covered (one history record each).
    pub recipients: usize,
    /// Recipients with no push address at all.
    pub record_only: usize,
    pub expo: DispatchOutcome,
    pub fcm: DispatchOutcome,
}

impl DeliveryReport {
    /// Successful channel attempts, the additive `total_sent` increment.
    pub fn sent_delta(&self) -> i64 {
        (self.expo.success_count + self.fcm.success_count) as i64
    }

    /// Failed channel attempts, the additive `total_failed` increment.
    /// Record-only recipients are not failures.
    pub fn failed_delta(&self) -> i64 {
        (self.expo.failed_total() + self.fcm.failed_total()) as i64
    }
}

/// Executes one message against a resolved recipient set.
pub struct DeliveryEngine {
    directory: Arc<dyn Directory>,
    sink: Arc<dyn DeliverySink>,
    expo: Arc<dyn ChannelDispatcher>,
    fcm: Arc<dyn ChannelDispatcher>,
}

impl DeliveryEngine {
    pub fn new(
        directory: Arc<dyn Directory>,
        sink: Arc<dyn DeliverySink>,
        expo: Arc<dyn ChannelDispatcher>,
        fcm: Arc<dyn ChannelDispatcher>,
    ) -> Self {
        Self {
            directory,
            sink,
            expo,
            fcm,
        }
    }

    /// Run one delivery.
    ///
    /// History records are written for every recipient before any push is
    /// attempted, so in-app history is complete even if dispatch fails
    /// partway. Both channels then fire in parallel; a channel failure is
    /// data in the report, never an error.
    pub async fn execute(
        &self,
        message: &PushMessage,
        recipients: &[DbId],
        job_id: Option<DbId>,
    ) -> Result<DeliveryReport, EngineError> {
        if recipients.is_empty() {
            return Ok(DeliveryReport::default());
        }

        let entries: Vec<DeliveryEntry> = recipients
            .iter()
            .map(|&recipient_id| DeliveryEntry {
                recipient_id,
                title: message.title.clone(),
                body: message.body.clone(),
                message_type: message.message_type.clone(),
                job_id,
            })
            .collect();
        self.sink.append(&entries).await.map_err(EngineError::Record)?;

        let addresses = self
            .directory
            .find_addresses(recipients)
            .await
            .map_err(EngineError::Addresses)?;
        let batches = ChannelBatches::from_addresses(&addresses);

        let (expo, fcm) = tokio::join!(
            self.expo.dispatch(&batches.expo, message),
            self.fcm.dispatch(&batches.fcm, message),
        );

        tracing::info!(
            recipients = recipients.len(),
            record_only = batches.record_only,
            expo_sent = expo.success_count,
            expo_failed = expo.failed_total(),
            fcm_sent = fcm.success_count,
            fcm_failed = fcm.failed_total(),
            "Delivery run finished"
        );

        Ok(DeliveryReport {
            recipients: recipients.len(),
            record_only: batches.record_only,
            expo,
            fcm,
        })
    }
}
