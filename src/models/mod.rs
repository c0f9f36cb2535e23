// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod participation;
pub mod token;
pub mod verdict;

pub use participation::{NewParticipation, ParticipationRecord};
pub use token::{CheckinToken, EventId, UserId};
pub use verdict::CheckinVerdict;
