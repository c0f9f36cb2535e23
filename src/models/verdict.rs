// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Outcome of one scan attempt at a check-in station.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{EventId, UserId};

/// Terminal classification of a scanned token.
///
/// Not persisted. Registry outages are not a verdict; they surface as
/// [`crate::services::CheckinError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum CheckinVerdict {
    /// Registered for this event; let them in.
    Valid {
        user_id: UserId,
        event_id: EventId,
        #[serde(skip_serializing_if = "Option::is_none")]
        registered_at: Option<DateTime<Utc>>,
    },
    /// Well-formed token issued for another event.
    WrongEvent {
        user_id: UserId,
        token_event_id: EventId,
        expected_event_id: EventId,
    },
    /// Well-formed token for this event, but no registration on record.
    NotRegistered { user_id: UserId },
    /// Unreadable image or payload that doesn't match `user:event:issued`.
    Malformed { reason: String },
}

impl CheckinVerdict {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed {
            reason: reason.into(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Valid { .. } => "valid",
            Self::WrongEvent { .. } => "wrong_event",
            Self::NotRegistered { .. } => "not_registered",
            Self::Malformed { .. } => "malformed",
        }
    }

    /// Message shown to the operator at the door.
    pub fn operator_message(&self) -> String {
        match self {
            Self::Valid { user_id, .. } => format!("Accepted: member {} is registered", user_id),
            Self::WrongEvent {
                token_event_id,
                expected_event_id,
                ..
            } => format!(
                "Wrong event: token is for event {}, this is event {}",
                token_event_id, expected_event_id
            ),
            Self::NotRegistered { user_id } => {
                format!("Denied: member {} is not registered for this event", user_id)
            }
            Self::Malformed { .. } => {
                "Unreadable token: rescan, or check the member ID manually".to_string()
            }
        }
    }
}
