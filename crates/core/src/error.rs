use crate::types::DbId;

/// Domain-level error for the notification core.
///
/// `Validation` and `Conflict` are user-visible rejections at the job write
/// path (no targeting strategy, deleting an executed campaign). `Internal`
/// wraps collaborator failures surfaced through the contracts.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
