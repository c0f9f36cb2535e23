// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in token and the identifier types it carries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::ParticipationRecord;

/// Club member identifier. Always positive once it leaves the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

/// Club event identifier. Always positive once it leaves the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Transient payload proving a participant's registration claim.
///
/// Never stored; it only lives inside the QR image handed to the participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckinToken {
    pub user_id: UserId,
    pub event_id: EventId,
    /// Unix seconds at issue time. Advisory only, no expiry is derived from it.
    pub issued_at: u64,
}

impl CheckinToken {
    pub fn new(user_id: UserId, event_id: EventId, issued_at: u64) -> Self {
        Self {
            user_id,
            event_id,
            issued_at,
        }
    }

    /// Build a token for a confirmed registration, stamped with `now`.
    pub fn issue(record: &ParticipationRecord, now: DateTime<Utc>) -> Self {
        // Pre-epoch clocks clamp to zero rather than wrapping.
        let issued_at = u64::try_from(now.timestamp()).unwrap_or(0);
        Self::new(record.user_id, record.event_id, issued_at)
    }

    /// Issue time as a UTC timestamp, if it fits chrono's range.
    pub fn issued_at_utc(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.issued_at).ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_issue_copies_ids_and_stamps_time() {
        let record = ParticipationRecord {
            id: 3,
            user_id: UserId(42),
            event_id: EventId(7),
            registered_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let now = Utc.timestamp_opt(1_716_400_000, 0).unwrap();

        let token = CheckinToken::issue(&record, now);

        assert_eq!(token.user_id, UserId(42));
        assert_eq!(token.event_id, EventId(7));
        assert_eq!(token.issued_at, 1_716_400_000);
        assert_eq!(token.issued_at_utc(), Some(now));
    }

    #[test]
    fn test_issued_at_out_of_range() {
        let token = CheckinToken::new(UserId(1), EventId(1), u64::MAX);
        assert_eq!(token.issued_at_utc(), None);
    }
}
