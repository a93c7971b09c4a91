//! Redis sliding-window rate limiting (spec.md §4.7 "Rate limiting").
//!
//! Keyed per caller with a coarser global ceiling layered on top; both
//! checks run as a single atomic Redis pipeline so a 429 decision never
//! touches Postgres, matching the 5 ms P95 budget in spec.md §7.
//! Grounded on the sliding-window-via-sorted-set pattern used for
//! auth-attempt throttling elsewhere in the corpus, generalized here from
//! login attempts to general request admission.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::extract::State;
use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use redis::AsyncCommands;
use turnstile_types::AppError;

use crate::response::ApiError;
use crate::state::AppState;

/// A coarser global ceiling than any one user's budget, so a single caller
/// exhausting their own bucket can't be mistaken for system-wide overload.
const GLOBAL_LIMIT_MULTIPLIER: u32 = 200;

#[derive(Clone)]
pub struct RateLimiter {
    conn: redis::aio::ConnectionManager,
}

pub struct Decision {
    pub limit: u32,
    pub remaining: u32,
    pub reset_secs: u64,
}

impl RateLimiter {
    pub async fn connect(redis_url: &str) -> turnstile_types::Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Internal(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Sliding window check-and-record over a 60 s window. Returns the
    /// admission decision; the caller maps a denial to 429.
    async fn check(&self, key: &str, limit: u32) -> turnstile_types::Result<Decision> {
        let mut conn = self.conn.clone();
        let window = Duration::from_secs(60);
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_millis() as u64;
        let window_start = now_ms.saturating_sub(window.as_millis() as u64);
        let rate_key = format!("ratelimit:{key}");

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .zrembyscore(&rate_key, 0, window_start as isize)
            .ignore()
            .zcard(&rate_key)
            .zadd(&rate_key, now_ms, now_ms)
            .ignore()
            .expire(&rate_key, window.as_secs() as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        let remaining = (limit as u64).saturating_sub(count + 1);
        let decision = Decision {
            limit,
            remaining: remaining as u32,
            reset_secs: window.as_secs(),
        };

        if count >= limit as u64 {
            let _: i64 = conn
                .zrem(&rate_key, now_ms)
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
            return Err(AppError::TooManyRequests);
        }

        Ok(decision)
    }
}

/// Axum middleware enforcing per-caller and global admission budgets
/// (spec.md §4.7). Applied to the contended-path routes (`queue/join`,
/// `bookings`) rather than globally, since read-mostly endpoints like
/// `GET /bookings/:id` don't share the same backpressure concern.
pub async fn rate_limit(State(state): State<AppState>, req: Request<axum::body::Body>, next: Next) -> Response {
    let caller_key = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let per_user_limit = state.config.rate_limit_per_user_per_minute;
    let global_limit = per_user_limit.saturating_mul(GLOBAL_LIMIT_MULTIPLIER);

    let decision = match state.rate_limiter.check(&caller_key, per_user_limit).await {
        Ok(d) => d,
        Err(err) => return rate_limited_response(&err, per_user_limit),
    };

    if let Err(err) = state.rate_limiter.check("global", global_limit).await {
        return rate_limited_response(&err, global_limit);
    }

    let mut response = next.run(req).await;
    set_rate_limit_headers(&mut response, decision.limit, decision.remaining, decision.reset_secs);
    response
}

fn rate_limited_response(err: &AppError, limit: u32) -> Response {
    let mut response = ApiError(AppError::TooManyRequests).into_response();
    set_rate_limit_headers(&mut response, limit, 0, 60);
    response.headers_mut().insert("retry-after", header_num(60));
    tracing::info!(error = %err, "rate limit exceeded");
    response
}

fn header_num(value: u64) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).expect("decimal string is always a valid header value")
}

fn set_rate_limit_headers(response: &mut Response, limit: u32, remaining: u32, reset_secs: u64) {
    let headers = response.headers_mut();
    headers.insert("x-ratelimit-limit", header_num(limit as u64));
    headers.insert("x-ratelimit-remaining", header_num(remaining as u64));
    headers.insert("x-ratelimit-reset", header_num(reset_secs));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn rate_limited_response_carries_retry_after_and_429() {
        let response = rate_limited_response(&AppError::TooManyRequests, 60);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("retry-after").unwrap(), "60");
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "0");
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "60");
    }

    #[test]
    fn set_rate_limit_headers_round_trips_values() {
        let mut response = axum::http::Response::new(axum::body::Body::empty());
        set_rate_limit_headers(&mut response, 100, 42, 60);
        assert_eq!(response.headers().get("x-ratelimit-limit").unwrap(), "100");
        assert_eq!(response.headers().get("x-ratelimit-remaining").unwrap(), "42");
        assert_eq!(response.headers().get("x-ratelimit-reset").unwrap(), "60");
    }
}
