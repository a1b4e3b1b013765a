//! Per-channel dispatch outcome aggregation.

/// One address that was attempted and rejected, with the channel-reported
/// (or transport-level) reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchFailure {
    pub token: String,
    pub reason: String,
}

/// Aggregated result of dispatching one message over one channel.
///
/// `invalid_count` covers tokens filtered out before any network call (bad
/// data); `failures` covers tokens the channel rejected or that were lost to
/// a chunk-level transport error (delivery rejected). Both count toward a
/// job's `total_failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchOutcome {
    pub success_count: usize,
    pub invalid_count: usize,
    pub failures: Vec<DispatchFailure>,
}

impl DispatchOutcome {
    /// Fold another outcome (typically one chunk's) into this one.
    pub fn merge(&mut self, other: DispatchOutcome) {
        self.success_count += other.success_count;
        self.invalid_count += other.invalid_count;
        self.failures.extend(other.failures);
    }

    /// Total failures for counter purposes: invalid plus rejected.
    pub fn failed_total(&self) -> usize {
        self.invalid_count + self.failures.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_accumulates_all_counters() {
        let mut a = DispatchOutcome {
            success_count: 3,
            invalid_count: 1,
            failures: vec![DispatchFailure {
                token: "t1".to_string(),
                reason: "DeviceNotRegistered".to_string(),
            }],
        };
        a.merge(DispatchOutcome {
            success_count: 2,
            invalid_count: 0,
            failures: vec![DispatchFailure {
                token: "t2".to_string(),
                reason: "transport: timeout".to_string(),
            }],
        });

        assert_eq!(a.success_count, 5);
        assert_eq!(a.invalid_count, 1);
        assert_eq!(a.failures.len(), 2);
        assert_eq!(a.failed_total(), 3);
    }

    #[test]
    fn empty_outcome_has_no_failures() {
        let outcome = DispatchOutcome::default();
        assert_eq!(outcome.success_count, 0);
        assert_eq!(outcome.failed_total(), 0);
    }
}
