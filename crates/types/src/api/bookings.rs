use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::enums::BookingStatus;

/// Durable booking record (spec.md §3 "Booking").
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct BookingResponse {
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

/// `POST /bookings` request body (spec.md §6). `X-Idempotency-Key` and
/// `X-Queue-Pass` travel as headers, not body fields — see
/// `turnstile-api`'s extractors.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateBookingRequest {
    pub event_id: Uuid,
    pub show_id: Uuid,
    pub zone_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
}

/// `POST /bookings` 201 response shape (spec.md §6: `{booking_id, status,
/// reservation_expires_at, payment_intent}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingResponse {
    pub booking_id: Uuid,
    pub status: BookingStatus,
    pub reservation_expires_at: Option<DateTime<Utc>>,
    pub payment_intent: Option<PaymentIntentResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub payment_id: String,
    pub client_secret: Option<String>,
    pub amount: Decimal,
    pub currency: String,
}

/// Paginated response for `ListUserBookings` (spec.md §4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserBookingsResponse {
    pub data: Vec<BookingResponse>,
}
