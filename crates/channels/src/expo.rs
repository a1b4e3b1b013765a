//! Expo push channel dispatcher.
//!
//! Wraps the Expo push HTTP API: token shapes are checked before any
//! network call, requests are chunked to 100 receipts each, and the ticket
//! array in the response is zipped back to tokens in order.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use edupush_core::message::PushMessage;
use regex::Regex;
use serde_json::{json, Value};

use crate::outcome::{DispatchFailure, DispatchOutcome};
use crate::transport::{PushTransport, TransportError};
use crate::ChannelDispatcher;

/// Maximum receipts per Expo push API call.
pub const MAX_BATCH: usize = 100;

/// Accepted token shapes: `ExponentPushToken[...]` / `ExpoPushToken[...]`.
fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^Expo(nent)?PushToken\[[A-Za-z0-9_-]+\]$")
            .expect("static Expo token pattern")
    })
}

/// Whether a stored token looks like an Expo push token at all.
pub fn is_valid_token(token: &str) -> bool {
    token_pattern().is_match(token)
}

/// Dispatches one logical message to a batch of Expo push tokens.
pub struct ExpoDispatcher {
    transport: Arc<dyn PushTransport>,
}

impl ExpoDispatcher {
    pub fn new(transport: Arc<dyn PushTransport>) -> Self {
        Self { transport }
    }

    /// Expo embeds the image URL at top level; the routing key and redirect
    /// ride in the `data` map.
    fn build_payload(tokens: &[String], message: &PushMessage) -> Value {
        let mut data = json!({ "type": message.routing_key() });
        if let Some(redirect) = &message.redirect {
            data["redirect"] = json!(redirect);
        }

        let mut payload = json!({
            "to": tokens,
            "title": message.title,
            "body": message.body,
            "sound": "default",
            "data": data,
        });
        if let Some(image) = &message.image_url {
            payload["image"] = json!(image);
        }
        payload
    }

    /// Map the response's ticket array to per-token outcomes, in order.
    ///
    /// A length mismatch means outcomes can no longer be attributed to
    /// tokens and is treated as a malformed response.
    fn parse_tickets(
        response: &Value,
        expected: usize,
    ) -> Result<Vec<Result<(), String>>, TransportError> {
        let tickets = response
            .get("data")
            .and_then(Value::as_array)
            .ok_or_else(|| TransportError::BadResponse("missing data array".to_string()))?;

        if tickets.len() != expected {
            return Err(TransportError::BadResponse(format!(
                "expected {expected} tickets, got {}",
                tickets.len()
            )));
        }

        Ok(tickets
            .iter()
            .map(|ticket| match ticket.get("status").and_then(Value::as_str) {
                Some("ok") => Ok(()),
                _ => {
                    let reason = ticket
                        .get("details")
                        .and_then(|d| d.get("error"))
                        .and_then(Value::as_str)
                        .or_else(|| ticket.get("message").and_then(Value::as_str))
                        .unwrap_or("unknown ticket error");
                    Err(reason.to_string())
                }
            })
            .collect())
    }

    /// Send one chunk. A transport-level error is converted into a failure
    /// for every token in the chunk so no address goes unaccounted.
    async fn send_chunk(&self, chunk: &[String], message: &PushMessage) -> DispatchOutcome {
        let payload = Self::build_payload(chunk, message);
        let per_token = match self.transport.post_chunk(&payload).await {
            Ok(response) => Self::parse_tickets(&response, chunk.len()),
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
                    channel = "expo",
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
impl ChannelDispatcher for ExpoDispatcher {
    fn name(&self) -> &'static str {
        "expo"
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
                channel = "expo",
                invalid = invalid.len(),
                "Dropped malformed tokens before dispatch"
            );
        }
        if valid.is_empty() {
            return outcome;
        }

        // Chunks share no mutable state, so they are sent concurrently;
        // join_all preserves chunk order for the merged failure list.
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
