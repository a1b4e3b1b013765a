use edupush_core::error::CoreError;

/// A failed job run, tagged with the phase that failed.
///
/// Channel dispatch never appears here: push failures are data in the run
/// outcome, not errors. An `EngineError` means the run as a whole did not
/// complete and the job should be retried on a later tick.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Targeting resolution failed: {0}")]
    Resolve(#[source] CoreError),

    #[error("Delivery history write failed: {0}")]
    Record(#[source] CoreError),

    #[error("Address lookup failed: {0}")]
    Addresses(#[source] CoreError),
}
