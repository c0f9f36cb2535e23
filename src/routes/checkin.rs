// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Door check-in route for operators.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::CheckinVerdict;
use crate::routes::event_id_from_path;
use crate::services::ScanInput;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::post,
    Extension, Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/events/{event_id}/checkin", post(checkin))
}

/// A scan from the check-in station. Exactly one field must be set.
#[derive(Debug, Deserialize, Validate)]
pub struct CheckinRequest {
    /// Payload read by a hardware scanner
    pub payload: Option<String>,
    /// Captured image (PNG or JPEG), base64-encoded
    #[validate(length(min = 1))]
    pub image_base64: Option<String>,
}

impl CheckinRequest {
    fn into_scan_input(self) -> Result<ScanInput> {
        match (self.payload, self.image_base64) {
            (Some(payload), None) => Ok(ScanInput::Payload(payload)),
            (None, Some(encoded)) => {
                let bytes = STANDARD.decode(encoded.trim()).map_err(|_| {
                    AppError::BadRequest("image_base64 is not valid base64".to_string())
                })?;
                Ok(ScanInput::ImageBytes(bytes))
            }
            _ => Err(AppError::BadRequest(
                "Provide exactly one of payload or image_base64".to_string(),
            )),
        }
    }
}

#[derive(Serialize)]
pub struct CheckinResponse {
    #[serde(flatten)]
    pub verdict: CheckinVerdict,
    /// Operator-facing message for the verdict
    pub message: String,
}

/// Validate a scanned token for this event.
///
/// Every readable or unreadable scan yields a verdict; only a registry
/// outage is an error (503) so the door can retry instead of denying entry.
async fn checkin(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<u64>,
    Json(request): Json<CheckinRequest>,
) -> Result<Json<CheckinResponse>> {
    user.require_operator()?;
    let event_id = event_id_from_path(event_id)?;
    request
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let input = request.into_scan_input()?;
    let verdict = state.validator.validate(input, event_id).await?;

    tracing::info!(
        operator_id = user.user_id.0,
        event_id = event_id.0,
        verdict = verdict.kind(),
        "Check-in scan processed"
    );

    Ok(Json(CheckinResponse {
        message: verdict.operator_message(),
        verdict,
    }))
}
