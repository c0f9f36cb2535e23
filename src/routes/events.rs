// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Event registration and token image routes.

use crate::error::Result;
use crate::middleware::auth::AuthUser;
use crate::routes::event_id_from_path;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::sync::Arc;

/// Event routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/events/{event_id}/registrations", post(register))
        .route("/api/events/{event_id}/token.png", get(token_image))
        .route("/api/events/{event_id}/participants", get(participant_count))
}

// ─── Registration ────────────────────────────────────────────

/// Confirmed registration with the participant's token.
#[derive(Serialize)]
pub struct RegistrationResponse {
    pub participation_id: i64,
    pub user_id: u64,
    pub event_id: u64,
    pub registered_at: String,
    /// Token payload embedded in the QR image
    pub payload: String,
    pub qr_png_base64: String,
}

/// Register the caller for an event.
async fn register(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<u64>,
) -> Result<(StatusCode, Json<RegistrationResponse>)> {
    let event_id = event_id_from_path(event_id)?;

    let registration = state.registration.register(user.user_id, event_id).await?;
    let participation = &registration.participation;

    Ok((
        StatusCode::CREATED,
        Json(RegistrationResponse {
            participation_id: participation.id,
            user_id: participation.user_id.0,
            event_id: participation.event_id.0,
            registered_at: format_utc_rfc3339(participation.registered_at),
            qr_png_base64: STANDARD.encode(&registration.png),
            payload: registration.payload,
        }),
    ))
}

// ─── Token Image ─────────────────────────────────────────────

/// PNG token image for the caller's registration.
async fn token_image(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<u64>,
) -> Result<Response> {
    let event_id = event_id_from_path(event_id)?;

    let registration = state
        .registration
        .issue_token(user.user_id, event_id)
        .await?;

    Ok(([(header::CONTENT_TYPE, "image/png")], registration.png).into_response())
}

// ─── Roster ──────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ParticipantCountResponse {
    pub event_id: u64,
    pub participants: u64,
}

/// Number of registered participants (operators only).
async fn participant_count(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<u64>,
) -> Result<Json<ParticipantCountResponse>> {
    user.require_operator()?;
    let event_id = event_id_from_path(event_id)?;

    let participants = state.db.count_participants(event_id).await?;

    Ok(Json(ParticipantCountResponse {
        event_id: event_id.0,
        participants,
    }))
}
