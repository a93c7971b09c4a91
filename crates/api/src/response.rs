//! Response envelope glue (spec.md §6: "All HTTP responses wrap payloads
//! as `{ success, data, error, meta }`"). Handlers return
//! `Result<Json<T>, ApiError>`; `ApiError` wraps an [`AppError`] and
//! renders it through [`turnstile_types::api::ApiResponse`] so success and
//! failure share one wire shape.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use turnstile_types::api::ApiResponse;
use turnstile_types::AppError;

pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = &self.0;
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if err.is_contention() {
            tracing::info!(code = %err.code(), "contended-resource outcome");
        } else if status.is_server_error() {
            tracing::error!(error = %err, code = %err.code(), "request failed");
        } else {
            tracing::warn!(error = %err, code = %err.code(), "request rejected");
        }

        (status, Json(ApiResponse::<()>::err(err))).into_response()
    }
}

/// Wraps a success payload in the envelope with a 200 status.
pub fn ok<T: serde::Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse::ok(data))
}

/// Wraps a success payload in the envelope with a 201 status.
pub fn created<T: serde::Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, Json(ApiResponse::ok(data)))
}
