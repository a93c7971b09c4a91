use axum::extract::State;
use axum::http::StatusCode;

use crate::state::AppState;

/// `GET /health` — liveness. Always 200 once the process is serving.
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// `GET /ready` — readiness. 503 if Postgres or Redis is unreachable.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if sqlx::query("SELECT 1").execute(&state.db).await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    if state.queue.ping().await.is_err() {
        return StatusCode::SERVICE_UNAVAILABLE;
    }

    StatusCode::OK
}
