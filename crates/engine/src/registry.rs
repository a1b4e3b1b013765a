//! Partition resolved recipients' addresses into per-channel token batches.

use edupush_core::contracts::RecipientAddresses;

/// The flattened token batches for one delivery run.
///
/// A recipient contributes at most one Expo token and any number of FCM
/// tokens; one with neither is counted as record-only (in-app history
/// exists, no push is attempted, and nothing is charged to the failure
/// counter).
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ChannelBatches {
    pub expo: Vec<String>,
    pub fcm: Vec<String>,
    pub record_only: usize,
}

impl ChannelBatches {
    pub fn from_addresses(addresses: &[RecipientAddresses]) -> Self {
        let mut batches = ChannelBatches::default();
        for address in addresses {
            let mut reachable = false;
            if let Some(token) = &address.expo_token {
                batches.expo.push(token.clone());
                reachable = true;
            }
            if !address.fcm_tokens.is_empty() {
                batches.fcm.extend(address.fcm_tokens.iter().cloned());
                reachable = true;
            }
            if !reachable {
                batches.record_only += 1;
            }
        }
        batches
    }
}

#[cfg(test)]
mod tests {
    use edupush_core::types::DbId;

    use super::*;

    fn address(id: DbId, expo: Option<&str>, fcm: &[&str]) -> RecipientAddresses {
        RecipientAddresses {
            recipient_id: id,
            expo_token: expo.map(str::to_string),
            fcm_tokens: fcm.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn splits_tokens_by_channel() {
        let batches = ChannelBatches::from_addresses(&[
            address(1, Some("ExponentPushToken[a]"), &[]),
            address(2, None, &["fcm-1", "fcm-2"]),
            address(3, Some("ExponentPushToken[b]"), &["fcm-3"]),
        ]);

        assert_eq!(batches.expo.len(), 2);
        assert_eq!(batches.fcm, vec!["fcm-1", "fcm-2", "fcm-3"]);
        assert_eq!(batches.record_only, 0);
    }

    #[test]
    fn counts_recipients_with_no_addresses() {
        let batches = ChannelBatches::from_addresses(&[
            address(1, None, &[]),
            address(2, Some("ExponentPushToken[a]"), &[]),
            address(3, None, &[]),
        ]);

        assert_eq!(batches.record_only, 2);
        assert_eq!(batches.expo.len(), 1);
        assert!(batches.fcm.is_empty());
    }

    #[test]
    fn a_multi_device_recipient_contributes_every_fcm_token() {
        let batches = ChannelBatches::from_addresses(&[address(1, None, &["a", "b", "c"])]);
        assert_eq!(batches.fcm.len(), 3);
        assert_eq!(batches.record_only, 0);
    }
}
