//! Push delivery channels.
//!
//! Each dispatcher wraps one push backend's batching limits, token format,
//! payload shape, and error taxonomy behind the uniform
//! [`ChannelDispatcher`] contract, so the delivery engine can aggregate
//! outcomes without channel-specific branching.

use async_trait::async_trait;
use edupush_core::message::PushMessage;

pub mod expo;
pub mod fcm;
pub mod outcome;
pub mod transport;

pub use outcome::{DispatchFailure, DispatchOutcome};

/// Uniform dispatch contract for both push channels.
#[async_trait]
pub trait ChannelDispatcher: Send + Sync {
    /// Channel name for logs and failure records.
    fn name(&self) -> &'static str;

    /// Send `message` to every token, chunked to the channel's batch limit.
    ///
    /// Never fails as a whole: malformed tokens are partitioned out before
    /// any network call and counted as invalid, and a chunk-level transport
    /// failure becomes a per-token failure for every token in that chunk.
    async fn dispatch(&self, tokens: &[String], message: &PushMessage) -> DispatchOutcome;
}
