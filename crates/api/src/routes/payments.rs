use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use turnstile_types::AppError;

use crate::response::ApiError;
use crate::state::AppState;

const SIGNATURE_HEADER: &str = "stripe-signature";

/// `POST /payments/webhook` (spec.md §4.5 "Payment Coordinator").
///
/// Stripe signs the raw body, so this must read `Bytes` rather than a
/// parsed `Json<T>` — re-serializing would invalidate the signature.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError(AppError::BadRequest("missing stripe-signature header".into())))?;

    state.orchestrator.handle_webhook(&body, signature).await?;
    Ok(StatusCode::OK)
}
