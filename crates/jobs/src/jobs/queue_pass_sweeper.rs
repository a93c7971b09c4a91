use turnstile_db::queries::sagas;
use turnstile_db::PgPool;
use turnstile_queue::QueueStore;

/// Queue-pass sweeper (spec.md §4.6, step 2). The pass key's own TTL
/// handles expiry for reads; this sweeper enforces consistency of the
/// `passes:{event_id}` index by dropping members whose backing key is
/// already gone. Scoped to events with a live (non-terminal) saga so the
/// sweep doesn't grow linearly with total event history.
pub async fn sweep_expired_passes(pool: &PgPool, queue: &QueueStore) -> anyhow::Result<u64> {
    let event_ids = sagas::distinct_active_event_ids(pool).await?;
    let mut removed = 0u64;

    for event_id in event_ids {
        match queue.sweep_expired_passes(event_id).await {
            Ok(n) => removed += n,
            Err(err) => {
                tracing::warn!(%event_id, error = %err, "failed to sweep expired queue passes");
            }
        }
    }

    Ok(removed)
}
