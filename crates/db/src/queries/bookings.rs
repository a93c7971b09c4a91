use rust_decimal::Decimal;
use sqlx::PgPool;
use turnstile_types::enums::BookingStatus;
use turnstile_types::Result;
use uuid::Uuid;

use crate::models::Booking;

/// Atomic insert-or-fetch on `(idempotency_key, user_id)` (spec.md §4.3:
/// "on unique-key collision return the existing booking"). Grounded on the
/// idiomatic Postgres upsert-idempotency pattern: `INSERT ... ON CONFLICT
/// DO NOTHING RETURNING *`, falling back to a `SELECT` when zero rows come
/// back.
#[allow(clippy::too_many_arguments)]
pub async fn create_booking(
    pool: &PgPool,
    tenant_id: Uuid,
    user_id: Uuid,
    event_id: Uuid,
    show_id: Uuid,
    zone_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    currency: &str,
    idempotency_key: &str,
) -> Result<Booking> {
    let total_price = unit_price * Decimal::from(quantity);

    let inserted = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (
            tenant_id, user_id, event_id, show_id, zone_id,
            quantity, unit_price, total_price, currency, status, idempotency_key
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10)
        ON CONFLICT (idempotency_key, user_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(tenant_id)
    .bind(user_id)
    .bind(event_id)
    .bind(show_id)
    .bind(zone_id)
    .bind(quantity)
    .bind(unit_price)
    .bind(total_price)
    .bind(currency)
    .bind(idempotency_key)
    .fetch_optional(pool)
    .await?;

    if let Some(booking) = inserted {
        return Ok(booking);
    }

    find_by_idempotency_key(pool, idempotency_key, user_id)
        .await?
        .ok_or_else(|| {
            turnstile_types::AppError::Internal(
                "idempotency conflict but no existing booking found".to_string(),
            )
        })
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(booking)
}

pub async fn find_by_idempotency_key(
    pool: &PgPool,
    idempotency_key: &str,
    user_id: Uuid,
) -> Result<Option<Booking>> {
    let booking = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE idempotency_key = $1 AND user_id = $2",
    )
    .bind(idempotency_key)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(booking)
}

pub async fn list_user_bookings(pool: &PgPool, user_id: Uuid) -> Result<Vec<Booking>> {
    let bookings = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(bookings)
}

pub async fn mark_status(
    pool: &PgPool,
    id: Uuid,
    status: BookingStatus,
    confirmation_code: Option<&str>,
) -> Result<Booking> {
    let booking = sqlx::query_as::<_, Booking>(
        r#"
        UPDATE bookings
        SET status = $2,
            confirmation_code = COALESCE($3, confirmation_code),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(confirmation_code)
    .fetch_one(pool)
    .await?;
    Ok(booking)
}
