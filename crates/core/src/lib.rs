//! Pure domain logic for the edupush notification core.
//!
//! This crate has zero internal dependencies and no database or HTTP
//! concerns, so the recurrence calculator, targeting rules, and lifecycle
//! state machine can be unit-tested in isolation and reused by any future
//! worker or CLI tooling.

pub mod contracts;
pub mod error;
pub mod job;
pub mod message;
pub mod recurrence;
pub mod status;
pub mod targeting;
pub mod types;
