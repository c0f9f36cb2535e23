// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod codec;
pub mod registration;
pub mod registry;
pub mod validator;

pub use codec::{CheckinTokenCodec, DecodeError, EncodingError, MalformedTokenError};
pub use registration::{Registration, RegistrationService};
pub use registry::{InMemoryRegistry, ParticipationRegistry, RegistryError};
pub use self::validator::{CheckinError, CheckinValidator, ScanInput};
