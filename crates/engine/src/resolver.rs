//! Targeting resolution: from a job's targeting inputs to recipient ids.

use std::collections::HashSet;
use std::sync::Arc;

use edupush_core::contracts::Directory;
use edupush_core::error::CoreError;
use edupush_core::job::NotificationJob;
use edupush_core::targeting::{AttributeFilter, TargetingStrategy};
use edupush_core::types::DbId;

/// Resolves a job's targeting strategy against the recipient directory.
pub struct TargetResolver {
    directory: Arc<dyn Directory>,
}

impl TargetResolver {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Resolve to a deduplicated recipient id list.
    ///
    /// Explicit targeting checks existence only; the other strategies go
    /// through the directory's active views. Unknown explicit ids and
    /// unmatched contact numbers are dropped silently, so the resolved set
    /// can be smaller than requested (or empty, which is a no-op run, not
    /// an error).
    pub async fn resolve(&self, job: &NotificationJob) -> Result<Vec<DbId>, CoreError> {
        let ids = match job.strategy() {
            TargetingStrategy::Broadcast { language } => {
                let filter = AttributeFilter::language_only(language.map(str::to_string));
                self.directory.find_active(&filter).await?
            }
            TargetingStrategy::Explicit(ids) => self.directory.find_existing(ids).await?,
            TargetingStrategy::Contact(numbers) => self.directory.find_by_contact(numbers).await?,
            TargetingStrategy::Filter(filter) => self.directory.find_active(filter).await?,
        };
        Ok(dedup_preserving_order(ids))
    }
}

/// Drop duplicate ids, keeping the first occurrence's position.
fn dedup_preserving_order(ids: Vec<DbId>) -> Vec<DbId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}
