//! Targeting: who a campaign goes to.
//!
//! A job carries three targeting inputs — an explicit recipient field, a
//! phone-number list, and an attribute filter — of which exactly one
//! strategy applies, selected by [`TargetingStrategy::select`] with
//! first-match-wins precedence. A job with none of the three set is rejected
//! at write time by [`validate_targeting`].

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

// ---------------------------------------------------------------------------
// ExplicitRecipients
// ---------------------------------------------------------------------------

/// The explicit recipient field as a three-state type.
///
/// The persisted column (and the legacy wire format) overloads null: SQL
/// NULL means the field is not in play, JSON null means "broadcast to every
/// active recipient", and a JSON array names recipients directly. This enum
/// makes the three states impossible to confuse in code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ExplicitRecipients {
    /// Field absent: explicit targeting is not in play.
    #[default]
    NotSet,
    /// Broadcast marker: every active recipient (optionally narrowed by the
    /// job's language filter).
    Broadcast,
    /// Exactly these recipients, whether or not they are active.
    Specific(Vec<DbId>),
}

impl ExplicitRecipients {
    /// Whether explicit targeting takes precedence over the other inputs.
    pub fn is_set(&self) -> bool {
        !matches!(self, ExplicitRecipients::NotSet)
    }

    /// Decode from the persisted JSONB column.
    ///
    /// SQL NULL = `NotSet`, JSON null = `Broadcast`, JSON array = `Specific`.
    pub fn from_column(value: Option<&serde_json::Value>) -> Result<Self, CoreError> {
        match value {
            None => Ok(ExplicitRecipients::NotSet),
            Some(serde_json::Value::Null) => Ok(ExplicitRecipients::Broadcast),
            Some(serde_json::Value::Array(items)) => {
                let ids = items
                    .iter()
                    .map(|v| {
                        v.as_i64().ok_or_else(|| {
                            CoreError::Validation(format!(
                                "explicit_recipients entry is not an id: {v}"
                            ))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ExplicitRecipients::Specific(ids))
            }
            Some(other) => Err(CoreError::Validation(format!(
                "explicit_recipients must be null or an id array, got {other}"
            ))),
        }
    }

    /// Encode for the persisted JSONB column (inverse of [`from_column`]).
    ///
    /// [`from_column`]: ExplicitRecipients::from_column
    pub fn to_column(&self) -> Option<serde_json::Value> {
        match self {
            ExplicitRecipients::NotSet => None,
            ExplicitRecipients::Broadcast => Some(serde_json::Value::Null),
            ExplicitRecipients::Specific(ids) => Some(serde_json::json!(ids)),
        }
    }
}

/// Deserialize an `explicit_recipients` DTO field.
///
/// Use together with `#[serde(default, deserialize_with = ...)]`: an absent
/// field stays `NotSet` via the default, an explicit `null` is the broadcast
/// marker, and an array names recipients.
pub fn deserialize_explicit_recipients<'de, D>(
    deserializer: D,
) -> Result<ExplicitRecipients, D::Error>
where
    D: Deserializer<'de>,
{
    let ids: Option<Vec<DbId>> = Option::deserialize(deserializer)?;
    Ok(match ids {
        None => ExplicitRecipients::Broadcast,
        Some(ids) => ExplicitRecipients::Specific(ids),
    })
}

// ---------------------------------------------------------------------------
// AttributeFilter
// ---------------------------------------------------------------------------

/// Conjunctive predicate over recipient directory attributes.
///
/// Each key is an explicit "no constraint" (`None`) or a required value;
/// absence of a key never narrows the result set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl AttributeFilter {
    /// True when no key constrains the directory query.
    pub fn is_empty(&self) -> bool {
        self.institution.is_none()
            && self.program.is_none()
            && self.stage.is_none()
            && self.language.is_none()
    }

    /// A filter constraining only the language, used by the broadcast path.
    pub fn language_only(language: Option<String>) -> Self {
        AttributeFilter {
            language,
            ..AttributeFilter::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Strategy selection
// ---------------------------------------------------------------------------

/// The mutually exclusive targeting strategies, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetingStrategy<'a> {
    /// Every active recipient, optionally narrowed by language.
    Broadcast { language: Option<&'a str> },
    /// Exactly these recipient ids (existence checked, active state not).
    Explicit(&'a [DbId]),
    /// Directory lookup by contact number, active recipients only.
    Contact(&'a [String]),
    /// Conjunctive attribute filter, active recipients only.
    Filter(&'a AttributeFilter),
}

impl<'a> TargetingStrategy<'a> {
    /// Select the strategy for a job's targeting inputs.
    ///
    /// First match wins: an explicit field (broadcast marker or id list)
    /// beats phone numbers, which beat the attribute filter. These are
    /// alternatives, never combinable filters.
    pub fn select(
        explicit: &'a ExplicitRecipients,
        phone_numbers: &'a [String],
        filter: &'a AttributeFilter,
    ) -> TargetingStrategy<'a> {
        match explicit {
            ExplicitRecipients::Broadcast => TargetingStrategy::Broadcast {
                language: filter.language.as_deref(),
            },
            ExplicitRecipients::Specific(ids) => TargetingStrategy::Explicit(ids),
            ExplicitRecipients::NotSet if !phone_numbers.is_empty() => {
                TargetingStrategy::Contact(phone_numbers)
            }
            ExplicitRecipients::NotSet => TargetingStrategy::Filter(filter),
        }
    }
}

/// Write-path validation: a job must carry at least one targeting input.
///
/// An empty `Specific` list is rejected too — it would target nobody while
/// claiming explicit intent.
pub fn validate_targeting(
    explicit: &ExplicitRecipients,
    phone_numbers: &[String],
    filter: &AttributeFilter,
) -> Result<(), CoreError> {
    match explicit {
        ExplicitRecipients::Broadcast => Ok(()),
        ExplicitRecipients::Specific(ids) if ids.is_empty() => Err(CoreError::Validation(
            "explicit_recipients must not be an empty list".to_string(),
        )),
        ExplicitRecipients::Specific(_) => Ok(()),
        ExplicitRecipients::NotSet => {
            if !phone_numbers.is_empty() || !filter.is_empty() {
                Ok(())
            } else {
                Err(CoreError::Validation(
                    "Job has no targeting strategy: set explicit recipients, \
                     phone numbers, or an attribute filter"
                        .to_string(),
                ))
            }
        }
    }
}
