use sqlx::PgPool;
use turnstile_types::Result;
use uuid::Uuid;

use crate::models::IdempotencyRecord;

pub async fn record(
    pool: &PgPool,
    idempotency_key: &str,
    user_id: Uuid,
    booking_id: Uuid,
) -> Result<IdempotencyRecord> {
    let record = sqlx::query_as::<_, IdempotencyRecord>(
        r#"
        INSERT INTO idempotency_records (idempotency_key, user_id, booking_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (idempotency_key, user_id) DO UPDATE SET idempotency_key = EXCLUDED.idempotency_key
        RETURNING *
        "#,
    )
    .bind(idempotency_key)
    .bind(user_id)
    .bind(booking_id)
    .fetch_one(pool)
    .await?;
    Ok(record)
}

pub async fn find(
    pool: &PgPool,
    idempotency_key: &str,
    user_id: Uuid,
) -> Result<Option<IdempotencyRecord>> {
    let record = sqlx::query_as::<_, IdempotencyRecord>(
        "SELECT * FROM idempotency_records WHERE idempotency_key = $1 AND user_id = $2",
    )
    .bind(idempotency_key)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(record)
}
