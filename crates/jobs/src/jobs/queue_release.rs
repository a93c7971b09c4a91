use chrono::Utc;
use turnstile_db::queries::show_zones;
use turnstile_db::PgPool;
use turnstile_queue::QueueStore;

/// Queue-release job (spec.md §4.2 "Admission rate": "Admit at most N
/// users per second into the booking path"). Ticks every event currently
/// open for booking, governs each against its own per-second budget, and
/// mints passes for whoever the budget admits this tick.
pub async fn release_admitted_batches(pool: &PgPool, queue: &QueueStore, pass_ttl_secs: i64) -> anyhow::Result<u64> {
    let now = Utc::now();
    let events = show_zones::open_events(pool, now).await?;
    let pass_ttl = chrono::Duration::seconds(pass_ttl_secs);
    let mut released = 0u64;

    for event in events {
        if event.release_rate <= 0 {
            continue;
        }

        let granted = match queue.govern_admission(event.id, event.release_rate as i64, event.release_rate as i64).await {
            Ok(granted) => granted,
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "failed to govern queue admission");
                continue;
            }
        };

        if granted <= 0 {
            continue;
        }

        match queue.release_batch(event.id, granted, pass_ttl).await {
            Ok(passes) => released += passes.len() as u64,
            Err(err) => {
                tracing::warn!(event_id = %event.id, error = %err, "failed to release queue batch");
            }
        }
    }

    Ok(released)
}
