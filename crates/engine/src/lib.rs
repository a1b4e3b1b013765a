//! The delivery engine and scheduler loop.
//!
//! [`scheduler::Scheduler`] polls for due campaigns, resolves their targets
//! through [`resolver::TargetResolver`], and hands each run to
//! [`delivery::DeliveryEngine`], which writes history records and fans the
//! push out across both channels. Everything is written against the
//! `edupush-core` contracts, so the Postgres backend and the in-memory test
//! fakes are interchangeable.

pub mod config;
pub mod delivery;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod scheduler;

pub use error::EngineError;
