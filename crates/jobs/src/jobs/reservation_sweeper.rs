use chrono::Utc;
use turnstile_core::SagaOrchestrator;
use turnstile_db::queries::reservations;
use turnstile_db::PgPool;

/// Reservation sweeper (spec.md §4.6, step 1). Runs every `tick` (default
/// 1 s): finds reservations whose `expires_at <= now` and drives each
/// owning saga `RESERVED → FAILED(EXPIRED)`, which enqueues the release
/// compensation.
pub async fn sweep_expired_reservations(pool: &PgPool, orchestrator: &SagaOrchestrator) -> anyhow::Result<usize> {
    let expired = reservations::find_expired(pool, Utc::now()).await?;
    let mut swept = 0usize;

    for reservation in expired {
        match orchestrator.expire_reservation(reservation.booking_id).await {
            Ok(()) => swept += 1,
            Err(err) => {
                tracing::warn!(
                    booking_id = %reservation.booking_id,
                    error = %err,
                    "failed to expire reservation"
                );
            }
        }
    }

    Ok(swept)
}
