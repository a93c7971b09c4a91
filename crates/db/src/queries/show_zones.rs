use chrono::{DateTime, Utc};
use sqlx::PgPool;
use turnstile_types::Result;
use uuid::Uuid;

use crate::models::{Event, Show, Zone};

pub async fn find_event(pool: &PgPool, id: Uuid) -> Result<Option<Event>> {
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(event)
}

/// Events currently admitting from their waiting room (spec.md §4.2
/// "Admission rate" runs per open event). Backs the queue-release job,
/// which has no per-event trigger of its own and must discover its
/// working set by polling.
pub async fn open_events(pool: &PgPool, now: DateTime<Utc>) -> Result<Vec<Event>> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE booking_opens_at <= $1 AND booking_closes_at > $1",
    )
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(events)
}

pub async fn find_show(pool: &PgPool, id: Uuid) -> Result<Option<Show>> {
    let show = sqlx::query_as::<_, Show>("SELECT * FROM shows WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(show)
}

pub async fn find_zone(pool: &PgPool, id: Uuid) -> Result<Option<Zone>> {
    let zone = sqlx::query_as::<_, Zone>("SELECT * FROM zones WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(zone)
}

/// Saga `PAID → CONFIRMED` step (spec.md §4.1 Consume: "increments
/// `sold_count` in the durable store; `available` is not changed").
pub async fn increment_sold_count(pool: &PgPool, zone_id: Uuid, quantity: i32) -> Result<Zone> {
    let zone = sqlx::query_as::<_, Zone>(
        "UPDATE zones SET sold_count = sold_count + $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(zone_id)
    .bind(quantity)
    .fetch_one(pool)
    .await?;
    Ok(zone)
}

/// Internal seed helper — this core never exposes CRUD for event/show/zone
/// master data (SPEC_FULL §2); upstream owns it, this just mirrors it.
pub async fn seed_zone(
    pool: &PgPool,
    id: Uuid,
    show_id: Uuid,
    price: rust_decimal::Decimal,
    currency: &str,
    total_seats: i32,
) -> Result<Zone> {
    let zone = sqlx::query_as::<_, Zone>(
        r#"
        INSERT INTO zones (id, show_id, price, currency, total_seats)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (id) DO UPDATE SET price = EXCLUDED.price, total_seats = EXCLUDED.total_seats
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(show_id)
    .bind(price)
    .bind(currency)
    .bind(total_seats)
    .fetch_one(pool)
    .await?;
    Ok(zone)
}

/// Internal seed helper, same rationale as [`seed_zone`].
#[allow(clippy::too_many_arguments)]
pub async fn seed_event(
    pool: &PgPool,
    id: Uuid,
    tenant_id: Uuid,
    booking_opens_at: DateTime<Utc>,
    booking_closes_at: DateTime<Utc>,
    max_per_user: i32,
    queue_capacity: i32,
    release_rate: i32,
    max_wait_secs: i32,
) -> Result<Event> {
    let event = sqlx::query_as::<_, Event>(
        r#"
        INSERT INTO events (
            id, tenant_id, booking_opens_at, booking_closes_at,
            max_per_user, queue_capacity, release_rate, max_wait_secs
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE SET
            booking_opens_at = EXCLUDED.booking_opens_at,
            booking_closes_at = EXCLUDED.booking_closes_at,
            max_per_user = EXCLUDED.max_per_user,
            queue_capacity = EXCLUDED.queue_capacity,
            release_rate = EXCLUDED.release_rate,
            max_wait_secs = EXCLUDED.max_wait_secs
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(tenant_id)
    .bind(booking_opens_at)
    .bind(booking_closes_at)
    .bind(max_per_user)
    .bind(queue_capacity)
    .bind(release_rate)
    .bind(max_wait_secs)
    .fetch_one(pool)
    .await?;
    Ok(event)
}
