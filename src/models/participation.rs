// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Participation model for storage and lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{EventId, UserId};

/// A stored registration of a user for an event.
///
/// Unique per (user_id, event_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipationRecord {
    /// Row id assigned by the database
    pub id: i64,
    pub user_id: UserId,
    pub event_id: EventId,
    /// When the user registered
    pub registered_at: DateTime<Utc>,
}

/// Insert form of a participation (no id yet).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewParticipation {
    pub user_id: UserId,
    pub event_id: EventId,
    pub registered_at: DateTime<Utc>,
}

impl NewParticipation {
    pub fn now(user_id: UserId, event_id: EventId) -> Self {
        Self {
            user_id,
            event_id,
            registered_at: Utc::now(),
        }
    }

    /// Attach the row id the database assigned.
    pub fn into_record(self, id: i64) -> ParticipationRecord {
        ParticipationRecord {
            id,
            user_id: self.user_id,
            event_id: self.event_id,
            registered_at: self.registered_at,
        }
    }
}
