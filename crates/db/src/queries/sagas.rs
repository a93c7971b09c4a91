use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use turnstile_types::enums::SagaState;
use turnstile_types::{AppError, Result};
use uuid::Uuid;

use crate::models::{SagaInstance, SagaTransition};

pub async fn create(
    pool: &PgPool,
    booking_id: Uuid,
    event_id: Uuid,
    user_id: Uuid,
) -> Result<SagaInstance> {
    let saga = sqlx::query_as::<_, SagaInstance>(
        r#"
        INSERT INTO saga_instances (booking_id, event_id, user_id, state, data, version)
        VALUES ($1, $2, $3, 'CREATED', '{}'::jsonb, 0)
        RETURNING *
        "#,
    )
    .bind(booking_id)
    .bind(event_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(saga)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<SagaInstance>> {
    let saga = sqlx::query_as::<_, SagaInstance>("SELECT * FROM saga_instances WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(saga)
}

pub async fn find_by_booking_id(pool: &PgPool, booking_id: Uuid) -> Result<Option<SagaInstance>> {
    let saga = sqlx::query_as::<_, SagaInstance>(
        "SELECT * FROM saga_instances WHERE booking_id = $1",
    )
    .bind(booking_id)
    .fetch_optional(pool)
    .await?;
    Ok(saga)
}

pub async fn find_by_payment_id(pool: &PgPool, payment_id: &str) -> Result<Option<SagaInstance>> {
    let saga = sqlx::query_as::<_, SagaInstance>(
        "SELECT * FROM saga_instances WHERE payment_id = $1",
    )
    .bind(payment_id)
    .fetch_optional(pool)
    .await?;
    Ok(saga)
}

/// Sagas eligible for stall recovery (spec.md §4.4 "Recovery"; §9
/// "Stalled-saga recovery"): non-terminal and not updated within
/// `stall_timeout`.
pub async fn find_stale(
    pool: &PgPool,
    stall_before: DateTime<Utc>,
) -> Result<Vec<SagaInstance>> {
    let sagas = sqlx::query_as::<_, SagaInstance>(
        r#"
        SELECT * FROM saga_instances
        WHERE state NOT IN ('CONFIRMED', 'FAILED', 'CANCELLED')
          AND updated_at < $1
        "#,
    )
    .bind(stall_before)
    .fetch_all(pool)
    .await?;
    Ok(sagas)
}

/// Event ids with at least one non-terminal saga (spec.md §4.6 "Queue-pass
/// sweeper"): the sweeper only needs to scan pass indices for events that
/// are still actively selling.
pub async fn distinct_active_event_ids(pool: &PgPool) -> Result<Vec<Uuid>> {
    let rows: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT DISTINCT event_id FROM saga_instances WHERE state NOT IN ('CONFIRMED', 'FAILED', 'CANCELLED')",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|(id,)| id).collect())
}

/// Applies an optimistic-versioned transition and appends the audit row in
/// one transaction (spec.md §4.4 "Transition audit"; §4.3 "optimistic
/// version counter to prevent lost updates"). Returns
/// `AppError::Conflict` on a version mismatch so the caller can retry once,
/// per SPEC_FULL §3.
#[allow(clippy::too_many_arguments)]
pub async fn transition(
    pool: &PgPool,
    saga_id: Uuid,
    expected_version: i32,
    to_state: SagaState,
    reservation_id: Option<Uuid>,
    payment_id: Option<&str>,
    confirmation_id: Option<&str>,
    error_message: Option<&str>,
    reason: &str,
    data: Option<Value>,
) -> Result<SagaInstance> {
    let mut tx = pool.begin().await?;

    let current = sqlx::query_as::<_, SagaInstance>(
        "SELECT * FROM saga_instances WHERE id = $1 FOR UPDATE",
    )
    .bind(saga_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("saga {saga_id} not found")))?;

    if current.version != expected_version {
        tx.rollback().await.ok();
        return Err(AppError::Conflict(format!(
            "saga {saga_id} version mismatch: expected {expected_version}, found {}",
            current.version
        )));
    }

    if !current.state.can_transition_to(to_state) {
        tx.rollback().await.ok();
        return Err(AppError::Conflict(format!(
            "illegal saga transition: {:?} -> {:?}",
            current.state, to_state
        )));
    }

    let completed_at = to_state.is_terminal().then(|| Utc::now());

    let updated = sqlx::query_as::<_, SagaInstance>(
        r#"
        UPDATE saga_instances
        SET state = $2,
            previous_state = $3,
            reservation_id = COALESCE($4, reservation_id),
            payment_id = COALESCE($5, payment_id),
            confirmation_id = COALESCE($6, confirmation_id),
            error_message = $7,
            data = COALESCE($8, data),
            version = version + 1,
            updated_at = NOW(),
            completed_at = COALESCE($9, completed_at)
        WHERE id = $1 AND version = $10
        RETURNING *
        "#,
    )
    .bind(saga_id)
    .bind(to_state)
    .bind(current.state)
    .bind(reservation_id)
    .bind(payment_id)
    .bind(confirmation_id)
    .bind(error_message)
    .bind(data)
    .bind(completed_at)
    .bind(expected_version)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO saga_transitions (saga_id, from_state, to_state, reason)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(saga_id)
    .bind(current.state)
    .bind(to_state)
    .bind(reason)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(updated)
}

/// Bumps `retry_count` and `updated_at` without changing state, used when a
/// step handler retries a transient failure (spec.md §4.4 step handler for
/// `CREATED → RESERVED`).
pub async fn bump_retry(pool: &PgPool, saga_id: Uuid) -> Result<SagaInstance> {
    let saga = sqlx::query_as::<_, SagaInstance>(
        "UPDATE saga_instances SET retry_count = retry_count + 1, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(saga_id)
    .fetch_one(pool)
    .await?;
    Ok(saga)
}

/// Records the gateway-issued `payment_id` without moving the state
/// machine (spec.md §4.5: the intent is created while the saga stays in
/// `RESERVED`, parked for a webhook). Version-checked like a transition,
/// but no transition row is appended since the state does not change.
pub async fn set_payment_id(
    pool: &PgPool,
    saga_id: Uuid,
    expected_version: i32,
    payment_id: &str,
) -> Result<SagaInstance> {
    let saga = sqlx::query_as::<_, SagaInstance>(
        r#"
        UPDATE saga_instances
        SET payment_id = $3, version = version + 1, updated_at = NOW()
        WHERE id = $1 AND version = $2
        RETURNING *
        "#,
    )
    .bind(saga_id)
    .bind(expected_version)
    .bind(payment_id)
    .fetch_optional(pool)
    .await?;

    saga.ok_or_else(|| AppError::Conflict(format!("saga {saga_id} version mismatch")))
}

pub async fn list_transitions(pool: &PgPool, saga_id: Uuid) -> Result<Vec<SagaTransition>> {
    let rows = sqlx::query_as::<_, SagaTransition>(
        "SELECT * FROM saga_transitions WHERE saga_id = $1 ORDER BY created_at ASC",
    )
    .bind(saga_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}
