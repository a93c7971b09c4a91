use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Backs the `(idempotency_key, user_id) -> booking_id` mapping (spec.md §3
/// Invariants, #4; §4.3 `CreateBooking`).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct IdempotencyRecord {
    pub idempotency_key: String,
    pub user_id: Uuid,
    pub booking_id: Uuid,
    pub created_at: DateTime<Utc>,
}
