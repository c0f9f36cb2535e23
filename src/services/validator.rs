// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Check-in validation.
//!
//! One pass per scan, no retries and no stored state:
//! 1. Decode the image to a payload (image inputs only)
//! 2. Parse the payload into a token
//! 3. Check the token was issued for the event at this door
//! 4. Confirm the registration with the registry

use crate::models::{CheckinVerdict, EventId};
use crate::services::codec::{CheckinTokenCodec, DecodeError};
use crate::services::registry::{ParticipationRegistry, RegistryError};
use image::DynamicImage;

/// Reason reported for any image that yields no payload.
pub const UNREADABLE_CODE: &str = "unreadable code";
/// Reason reported for payloads longer than any token.
pub const PAYLOAD_TOO_LONG: &str = "payload too long";

/// Longest possible payload: three `u64` fields and two separators.
pub const MAX_PAYLOAD_LEN: usize = 3 * 20 + 2;

/// What the check-in station captured.
#[derive(Debug, Clone)]
pub enum ScanInput {
    /// Decoded raster from a camera or file
    Image(DynamicImage),
    /// Encoded raster (PNG, JPEG) as uploaded
    ImageBytes(Vec<u8>),
    /// Payload already extracted by a hardware scanner
    Payload(String),
}

/// Validation failures that are not verdicts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CheckinError {
    /// Storage is down; the caller should retry, not deny entry.
    #[error("Participation registry unavailable: {0}")]
    RegistryUnavailable(String),
}

impl From<RegistryError> for CheckinError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Unavailable(reason) => Self::RegistryUnavailable(reason),
        }
    }
}

/// Turns a scan plus the expected event into a [`CheckinVerdict`].
#[derive(Debug, Clone)]
pub struct CheckinValidator<R> {
    registry: R,
    codec: CheckinTokenCodec,
}

impl<R: ParticipationRegistry> CheckinValidator<R> {
    pub fn new(registry: R, codec: CheckinTokenCodec) -> Self {
        Self { registry, codec }
    }

    pub fn registry(&self) -> &R {
        &self.registry
    }

    pub fn codec(&self) -> &CheckinTokenCodec {
        &self.codec
    }

    /// Validate a scan for `expected_event_id`.
    ///
    /// Decoding and parsing problems, wrong events and missing registrations
    /// are all verdicts. Only a registry outage is an error.
    pub async fn validate(
        &self,
        input: ScanInput,
        expected_event_id: EventId,
    ) -> Result<CheckinVerdict, CheckinError> {
        let payload = match self.decode(input).await {
            Ok(payload) => payload,
            Err(e) => {
                tracing::info!(
                    expected_event_id = expected_event_id.0,
                    error = %e,
                    "Check-in scan unreadable"
                );
                return Ok(CheckinVerdict::malformed(UNREADABLE_CODE));
            }
        };

        self.validate_payload(&payload, expected_event_id).await
    }

    /// Validate a raw payload string, skipping image decoding.
    pub async fn validate_payload(
        &self,
        payload: &str,
        expected_event_id: EventId,
    ) -> Result<CheckinVerdict, CheckinError> {
        let result = self.classify(payload, expected_event_id).await;

        match &result {
            Ok(verdict) => tracing::info!(
                expected_event_id = expected_event_id.0,
                verdict = verdict.kind(),
                "Check-in validated"
            ),
            Err(e) => tracing::warn!(
                expected_event_id = expected_event_id.0,
                error = %e,
                "Check-in could not be validated"
            ),
        }

        result
    }

    async fn classify(
        &self,
        payload: &str,
        expected_event_id: EventId,
    ) -> Result<CheckinVerdict, CheckinError> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Ok(CheckinVerdict::malformed(PAYLOAD_TOO_LONG));
        }

        let token = match self.codec.parse(payload) {
            Ok(token) => token,
            Err(e) => return Ok(CheckinVerdict::malformed(e.reason)),
        };

        if token.event_id != expected_event_id {
            return Ok(CheckinVerdict::WrongEvent {
                user_id: token.user_id,
                token_event_id: token.event_id,
                expected_event_id,
            });
        }

        if !self.registry.exists(token.user_id, token.event_id).await? {
            return Ok(CheckinVerdict::NotRegistered {
                user_id: token.user_id,
            });
        }

        let registered_at = self
            .registry
            .registered_at(token.user_id, token.event_id)
            .await?;

        tracing::debug!(
            user_id = token.user_id.0,
            event_id = token.event_id.0,
            issued_at = token.issued_at,
            "Registration confirmed"
        );

        Ok(CheckinVerdict::Valid {
            user_id: token.user_id,
            event_id: token.event_id,
            registered_at,
        })
    }

    /// Extract the payload; image decoding runs on the blocking pool.
    async fn decode(&self, input: ScanInput) -> Result<String, DecodeError> {
        let codec = self.codec;
        let task = match input {
            ScanInput::Payload(payload) => return Ok(payload),
            ScanInput::Image(image) => {
                tokio::task::spawn_blocking(move || codec.decode_image(&image))
            }
            ScanInput::ImageBytes(bytes) => {
                tokio::task::spawn_blocking(move || codec.decode_bytes(&bytes))
            }
        };

        task.await
            .map_err(|e| DecodeError::Unreadable(format!("decoder task failed: {}", e)))?
    }
}
