use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use turnstile_types::enums::BookingStatus;
use uuid::Uuid;

/// Durable order row (spec.md §3 "Booking"). Unique on `(idempotency_key,
/// user_id)`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub show_id: Uuid,
    pub zone_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub total_price: Decimal,
    pub currency: String,
    pub status: BookingStatus,
    pub confirmation_code: Option<String>,
    pub idempotency_key: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
