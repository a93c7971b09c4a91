use sqlx::PgPool;
use turnstile_types::Result;

use crate::models::PaymentCallback;

/// Inserts the dedup row; returns `Ok(None)` when `(payment_id, event_kind)`
/// was already seen (spec.md §4.5 "Callbacks are deduplicated").
pub async fn record_if_new(
    pool: &PgPool,
    payment_id: &str,
    event_kind: &str,
) -> Result<Option<PaymentCallback>> {
    let row = sqlx::query_as::<_, PaymentCallback>(
        r#"
        INSERT INTO payment_callbacks (payment_id, event_kind)
        VALUES ($1, $2)
        ON CONFLICT (payment_id, event_kind) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(payment_id)
    .bind(event_kind)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}
