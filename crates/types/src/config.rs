//! Centralized environment configuration.
//!
//! The teacher's `main.rs` reads `std::env::var` calls scattered across
//! startup code; this workspace has five binaries/crates (api, jobs,
//! inventory, queue, integrations) that all need `DATABASE_URL`/`REDIS_URL`/
//! gateway secrets, so they are collected here once and passed down as a
//! typed struct.

use std::env;
use std::time::Duration;

use crate::errors::{AppError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub bind_addr: String,

    /// HS256 shared secret backing the default `IdentityVerifier` (local dev
    /// and tests); production deployments supply a JWKS-backed verifier
    /// instead, wired up the same way the teacher wires `SupabaseAuth`.
    pub jwt_secret: String,

    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,

    /// Default reservation TTL in seconds (spec.md §3 "Reservation": 600 s).
    pub reservation_ttl_secs: i64,
    /// Default queue pass TTL in seconds (spec.md §3 "Queue Pass": 300 s).
    pub queue_pass_ttl_secs: i64,
    /// Saga step retry cap (spec.md §4.4).
    pub max_step_retries: u32,
    /// Saga stall timeout before recovery re-drives a step (spec.md §4.4,
    /// §9 "Stalled-saga recovery").
    pub saga_stall_timeout_secs: i64,
    /// Payment webhook timeout before a parked saga fails (spec.md §4.4:
    /// "timeout (default 10 min)").
    pub payment_timeout_secs: i64,

    /// Process-wide cap on inflight `POST /bookings` handlers (spec.md
    /// §4.7 "Concurrency limiter").
    pub booking_concurrency_limit: usize,
    /// Per-user request budget for the sliding-window rate limiter
    /// (spec.md §4.7 "Rate limiting").
    pub rate_limit_per_user_per_minute: u32,

    /// When true, the queue manager's SSE handler falls back to polling
    /// instead of subscribing to pub/sub (spec.md §9, first Open Question:
    /// "degraded mode permissible only when the pub/sub channel is
    /// unavailable"). Off by default.
    pub queue_poll_fallback: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string()),
            jwt_secret: require_env("JWT_SECRET")?,
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
            reservation_ttl_secs: env_parse_or("RESERVATION_TTL_SECS", 600),
            queue_pass_ttl_secs: env_parse_or("QUEUE_PASS_TTL_SECS", 300),
            max_step_retries: env_parse_or("MAX_STEP_RETRIES", 5),
            saga_stall_timeout_secs: env_parse_or("SAGA_STALL_TIMEOUT_SECS", 60),
            payment_timeout_secs: env_parse_or("PAYMENT_TIMEOUT_SECS", 600),
            booking_concurrency_limit: env_parse_or("BOOKING_CONCURRENCY_LIMIT", 512),
            rate_limit_per_user_per_minute: env_parse_or("RATE_LIMIT_PER_USER_PER_MINUTE", 60),
            queue_poll_fallback: env::var("QUEUE_POLL_FALLBACK")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    pub fn reservation_ttl(&self) -> Duration {
        Duration::from_secs(self.reservation_ttl_secs.max(0) as u64)
    }

    pub fn queue_pass_ttl(&self) -> Duration {
        Duration::from_secs(self.queue_pass_ttl_secs.max(0) as u64)
    }
}

fn require_env(key: &str) -> Result<String> {
    env::var(key).map_err(|_| AppError::Internal(format!("missing required env var {key}")))
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
