use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use turnstile_types::enums::ReservationStatus;
use turnstile_types::Result;
use uuid::Uuid;

use crate::models::Reservation;

#[allow(clippy::too_many_arguments)]
pub async fn create(
    pool: &PgPool,
    booking_id: Uuid,
    user_id: Uuid,
    zone_id: Uuid,
    show_id: Uuid,
    event_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    expires_at: DateTime<Utc>,
) -> Result<Reservation> {
    let reservation = sqlx::query_as::<_, Reservation>(
        r#"
        INSERT INTO reservations (
            booking_id, user_id, zone_id, show_id, event_id,
            quantity, unit_price, status, expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'reserved', $8)
        RETURNING *
        "#,
    )
    .bind(booking_id)
    .bind(user_id)
    .bind(zone_id)
    .bind(show_id)
    .bind(event_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(expires_at)
    .fetch_one(pool)
    .await?;
    Ok(reservation)
}

/// Idempotent insert for the reserve step (spec.md §4.4: "Each step is
/// idempotent: the same call on the same saga returns the same outcome").
/// Handles the crash window between the inventory engine accepting a
/// reservation and this audit row being written: a retried reserve step
/// observes `ALREADY_RESERVED` from the engine and calls this instead of
/// failing the saga over a row that already exists in spirit.
#[allow(clippy::too_many_arguments)]
pub async fn create_if_missing(
    pool: &PgPool,
    booking_id: Uuid,
    user_id: Uuid,
    zone_id: Uuid,
    show_id: Uuid,
    event_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    expires_at: DateTime<Utc>,
) -> Result<Reservation> {
    let inserted = sqlx::query_as::<_, Reservation>(
        r#"
        INSERT INTO reservations (
            booking_id, user_id, zone_id, show_id, event_id,
            quantity, unit_price, status, expires_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, 'reserved', $8)
        ON CONFLICT (booking_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(booking_id)
    .bind(user_id)
    .bind(zone_id)
    .bind(show_id)
    .bind(event_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(expires_at)
    .fetch_optional(pool)
    .await?;

    if let Some(reservation) = inserted {
        return Ok(reservation);
    }

    find_by_booking_id(pool, booking_id).await?.ok_or_else(|| {
        turnstile_types::AppError::Internal(
            "reservation conflict but no existing row found".to_string(),
        )
    })
}

pub async fn find_by_booking_id(pool: &PgPool, booking_id: Uuid) -> Result<Option<Reservation>> {
    let reservation =
        sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE booking_id = $1")
            .bind(booking_id)
            .fetch_optional(pool)
            .await?;
    Ok(reservation)
}

pub async fn mark_status(
    pool: &PgPool,
    booking_id: Uuid,
    status: ReservationStatus,
) -> Result<Reservation> {
    let reservation = sqlx::query_as::<_, Reservation>(
        "UPDATE reservations SET status = $2 WHERE booking_id = $1 RETURNING *",
    )
    .bind(booking_id)
    .bind(status)
    .fetch_one(pool)
    .await?;
    Ok(reservation)
}

/// Reservation sweeper query (spec.md §4.6, step 1): reservations whose
/// `expires_at <= now` and still `reserved`. The saga-state check happens
/// in the caller, which re-derives `RESERVED → FAILED` through the saga API
/// rather than mutating this row directly.
pub async fn find_expired(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<Reservation>> {
    let reservations = sqlx::query_as::<_, Reservation>(
        "SELECT * FROM reservations WHERE status = 'reserved' AND expires_at <= $1",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(reservations)
}
