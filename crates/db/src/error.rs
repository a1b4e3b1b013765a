use edupush_core::error::CoreError;
use edupush_core::types::DbId;

/// Error type for the persistence layer.
///
/// Lifecycle violations (`Immutable`, `Terminal`) are user-visible
/// rejections, not silent no-ops.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("JSON encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A persisted row no longer decodes into the domain model.
    #[error("Corrupt job row {id}: {detail}")]
    Corrupt { id: DbId, detail: String },

    #[error("Row {0} not found")]
    NotFound(DbId),

    /// Deletion guard: an already-executing campaign is immutable history.
    #[error("Job {0} has delivery history and cannot be deleted")]
    Immutable(DbId),

    #[error("Job {0} is already in a terminal state")]
    Terminal(DbId),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Domain(inner) => inner,
            StoreError::NotFound(id) => CoreError::NotFound {
                entity: "notification_job",
                id,
            },
            StoreError::Immutable(id) => {
                CoreError::Conflict(format!("Job {id} has delivery history"))
            }
            StoreError::Terminal(id) => {
                CoreError::Conflict(format!("Job {id} is already in a terminal state"))
            }
            other => CoreError::Internal(other.to_string()),
        }
    }
}
