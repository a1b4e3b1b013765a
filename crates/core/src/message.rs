//! Channel-neutral push content.
//!
//! Payload shaping (top-level vs nested image fields, mutable-content flags)
//! is a serialization concern local to each channel dispatcher; the rest of
//! the engine only ever sees this struct.

use serde::{Deserialize, Serialize};

/// One logical message, fanned out to every resolved recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// In-app destination opened when the notification is tapped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    /// Open classification tag, stored verbatim on delivery records and used
    /// to derive the client-side routing key.
    pub message_type: String,
}

impl PushMessage {
    /// Client-side routing key derived from the open `message_type` tag:
    /// trimmed, lowercased, inner whitespace collapsed to underscores.
    pub fn routing_key(&self) -> String {
        self.message_type
            .trim()
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(message_type: &str) -> PushMessage {
        PushMessage {
            title: "Exam timetable".to_string(),
            body: "The May timetable is out".to_string(),
            image_url: None,
            redirect: None,
            message_type: message_type.to_string(),
        }
    }

    #[test]
    fn routing_key_lowercases_and_joins() {
        assert_eq!(message("Exam Notice").routing_key(), "exam_notice");
    }

    #[test]
    fn routing_key_trims_and_collapses_whitespace() {
        assert_eq!(message("  Fee   Reminder ").routing_key(), "fee_reminder");
    }

    #[test]
    fn routing_key_keeps_simple_tags() {
        assert_eq!(message("announcement").routing_key(), "announcement");
    }
}
