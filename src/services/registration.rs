// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event registration and token issuing.
//!
//! Writes the participation records the check-in registry later reads, and
//! hands the participant a QR token image for their registration.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{CheckinToken, EventId, NewParticipation, ParticipationRecord, UserId};
use crate::services::codec::CheckinTokenCodec;
use chrono::Utc;

/// A confirmed registration with its freshly issued token.
#[derive(Debug, Clone)]
pub struct Registration {
    pub participation: ParticipationRecord,
    pub token: CheckinToken,
    /// Wire payload embedded in the image
    pub payload: String,
    /// PNG-encoded QR image
    pub png: Vec<u8>,
}

#[derive(Clone)]
pub struct RegistrationService {
    db: Database,
    codec: CheckinTokenCodec,
}

impl RegistrationService {
    pub fn new(db: Database, codec: CheckinTokenCodec) -> Self {
        Self { db, codec }
    }

    /// Register a user for an event and issue their token.
    ///
    /// Fails with [`AppError::Conflict`] if already registered.
    pub async fn register(&self, user_id: UserId, event_id: EventId) -> Result<Registration> {
        let new = NewParticipation::now(user_id, event_id);
        let id = self.db.insert_participation(&new).await?;
        let participation = new.into_record(id);

        tracing::info!(
            user_id = user_id.0,
            event_id = event_id.0,
            participation_id = id,
            "User registered for event"
        );

        self.issue(participation)
    }

    /// Re-issue a token for an existing registration.
    pub async fn issue_token(&self, user_id: UserId, event_id: EventId) -> Result<Registration> {
        let participation = self
            .db
            .find_participation(user_id, event_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "User {} is not registered for event {}",
                    user_id, event_id
                ))
            })?;

        self.issue(participation)
    }

    fn issue(&self, participation: ParticipationRecord) -> Result<Registration> {
        let token = CheckinToken::issue(&participation, Utc::now());
        let payload = self.codec.encode(&token);
        let png = self.codec.render_png(&payload)?;

        Ok(Registration {
            participation,
            token,
            payload,
            png,
        })
    }
}
