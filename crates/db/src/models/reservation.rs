use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use turnstile_types::enums::ReservationStatus;
use uuid::Uuid;

/// Durable audit copy of a soft hold (spec.md §3 "Reservation"). The
/// authoritative counters live in the inventory engine's store (§9,
/// "Ownership of inventory truth"); this row exists so the expiry sweeper
/// can query by `expires_at` without scanning the key-value store, and so
/// support can reconstruct what a booking reserved.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub user_id: Uuid,
    pub zone_id: Uuid,
    pub show_id: Uuid,
    pub event_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
