// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! UNICLUBS check-in: event registration and QR door check-in
//!
//! This crate provides the backend API that issues QR check-in tokens to
//! registered club members and validates scanned tokens at the door.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use services::{CheckinTokenCodec, CheckinValidator, RegistrationService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: Database,
    pub registration: RegistrationService,
    pub validator: CheckinValidator<Database>,
}

impl AppState {
    /// Wire up services over an opened database.
    pub fn new(config: Config, db: Database) -> Self {
        let codec = CheckinTokenCodec::new(config.qr_image_size);
        Self {
            registration: RegistrationService::new(db.clone(), codec),
            validator: CheckinValidator::new(db.clone(), codec),
            config,
            db,
        }
    }
}
