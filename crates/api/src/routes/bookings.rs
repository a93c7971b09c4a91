use axum::extract::{Path, State};
use axum::Json;
use turnstile_types::api::bookings::CreateBookingRequest;
use turnstile_types::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::middleware::AuthUser;
use crate::response::{created, ok, ApiError};
use crate::state::AppState;

const IDEMPOTENCY_KEY_HEADER: &str = "x-idempotency-key";
const QUEUE_PASS_HEADER: &str = "x-queue-pass";

/// `POST /bookings` (spec.md §6): "Create booking & reserve".
pub async fn create_booking(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    headers: axum::http::HeaderMap,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| ApiError(AppError::Validation(e.to_string())))?;

    let idempotency_key = header_str(&headers, IDEMPOTENCY_KEY_HEADER)
        .ok_or_else(|| ApiError(AppError::BadRequest("missing X-Idempotency-Key header".into())))?;
    let queue_pass = header_str(&headers, QUEUE_PASS_HEADER)
        .ok_or_else(|| ApiError(AppError::BadRequest("missing X-Queue-Pass header".into())))?;

    let response = state
        .orchestrator
        .create_booking(
            claims.tenant_id,
            claims.user_id,
            payload.event_id,
            payload.show_id,
            payload.zone_id,
            payload.quantity,
            idempotency_key,
            queue_pass,
        )
        .await?;

    Ok(created(response))
}

/// `GET /bookings/:id` (spec.md §6).
pub async fn get_booking(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let booking = state.orchestrator.get_booking(id, claims.user_id).await?;
    Ok(ok(booking))
}

/// List of the caller's own bookings. Not in spec.md §6's core endpoint
/// table, but `ListUserBookings` is a named operation (spec.md §4.3) with
/// no other endpoint to reach it.
pub async fn list_my_bookings(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
) -> Result<impl axum::response::IntoResponse, ApiError> {
    let bookings = state.orchestrator.list_user_bookings(claims.user_id).await?;
    Ok(ok(bookings))
}

fn header_str<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
