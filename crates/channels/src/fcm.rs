//! FCM multicast channel dispatcher.
//!
//! Wraps the FCM multicast send API: registration tokens are sanity-checked
//! before any network call, requests carry up to 500 registration ids, and
//! the per-token `results` array is zipped back to tokens in order.

use std::sync::Arc;

use async_trait::async_trait;
use edupush_core::message::PushMessage;
use serde_json::{json, Value};

use crate::outcome::{DispatchFailure, DispatchOutcome};
use crate::transport::{PushTransport, TransportError};
use crate::ChannelDispatcher;

/// Maximum registration ids per FCM multicast call.
pub const MAX_BATCH: usize = 500;

/// Registration tokens are opaque, but anything empty, whitespace-bearing,
/// or absurdly long is bad data rather than a deliverable address.
const MAX_TOKEN_LEN: usize = 4096;

/// Whether a stored registration token is plausibly deliverable.
pub fn is_valid_token(token: &str) -> bool {
    !token.is_empty() && token.len() <= MAX_TOKEN_LEN && !token.chars().any(char::is_whitespace)
}

/// Dispatches one logical message to a batch of FCM registration tokens.
pub struct FcmDispatcher {
    transport: Arc<dyn PushTransport>,
}

impl FcmDispatcher {
    pub fn new(transport: Arc<dyn PushTransport>) -> Self {
        Self { transport }
    }

    /// FCM wants platform-specific nested fields: the image rides in the
    /// notification block and the Android override, and iOS needs the
    /// mutable-content flag for the service extension to render it.
    fn build_payload(tokens: &[String], message: &PushMessage) -> Value {
        let mut notification = json!({
            "title": message.title,
            "body": message.body,
        });
        if let Some(image) = &message.image_url {
            notification["image"] = json!(image);
        }

        let mut data = json!({ "type": message.routing_key() });
        if let Some(redirect) = &message.redirect {
            data["redirect"] = json!(redirect);
        }

        let mut payload = json!({
            "registration_ids": tokens,
            "notification": notification,
            "data": data,
            "mutable_content": true,
            "apns": {
                "payload": { "aps": { "mutable-content": 1 } },
            },
        });
        if let Some(image) = &message.image_url {
            payload["android"] = json!({ "notification": { "image": image } });
        }
        payload
    }

    /// Map the response's `results` array to per-token outcomes, in order.
    fn parse_results(
        response: &Value,
        expected: usize,
    ) -> Result<Vec<Result<(), String>>, TransportError> {
        let results = response
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| TransportError::BadResponse("missing results array".to_string()))?;

        if results.len() != expected {
            return Err(TransportError::BadResponse(format!(
                "expected {expected} results, got {}",
                results.len()
            )));
        }

        Ok(results
            .iter()
            .map(|result| {
                if result.get("message_id").is_some() {
                    Ok(())
                } else {
                    let reason = result
                        .get("error")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown send error");
                    Err(reason.to_string())
                }
            })
            .collect())
    }

    async fn send_chunk(&self, chunk: &[String], message: &PushMessage) -> DispatchOutcome {
        let payload = Self::build_payload(chunk, message);
        let per_token = match self.transport.post_chunk(&payload).await {
            Ok(response) => Self::parse_results(&response, chunk.len()),
            Err(e) => Err(e),
        };

        let mut outcome = DispatchOutcome::default();
        match per_token {
            Ok(results) => {
                for (token, result) in chunk.iter().zip(results) {
                    match result {
                        Ok(()) => outcome.success_count += 1,
                        Err(reason) => outcome.failures.push(DispatchFailure {
                            token: token.clone(),
                            reason,
                        }),
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    channel = "fcm",
                    chunk_size = chunk.len(),
                    error = %e,
                    "Chunk dispatch failed"
                );
                let reason = format!("transport: {e}");
                for token in chunk {
                    outcome.failures.push(DispatchFailure {
                        token: token.clone(),
                        reason: reason.clone(),
                    });
                }
            }
        }
        outcome
    }
}

#[async_trait]
impl ChannelDispatcher for FcmDispatcher {
    fn name(&self) -> &'static str {
        "fcm"
    }

    async fn dispatch(&self, tokens: &[String], message: &PushMessage) -> DispatchOutcome {
        let (valid, invalid): (Vec<String>, Vec<String>) =
            tokens.iter().cloned().partition(|t| is_valid_token(t));

        let mut outcome = DispatchOutcome {
            invalid_count: invalid.len(),
            ..DispatchOutcome::default()
        };
        if !invalid.is_empty() {
            tracing::debug!(
                channel = "fcm",
                invalid = invalid.len(),
                "Dropped malformed tokens before dispatch"
            );
        }
        if valid.is_empty() {
            return outcome;
        }

        let chunk_outcomes = futures::future::join_all(
            valid.chunks(MAX_BATCH).map(|chunk| self.send_chunk(chunk, message)),
        )
        .await;
        for chunk_outcome in chunk_outcomes {
            outcome.merge(chunk_outcome);
        }
        outcome
    }
}
