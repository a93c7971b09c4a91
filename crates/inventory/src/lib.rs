//! Inventory Engine (spec.md §4.1): authoritative, low-latency seat-count
//! arithmetic over a Redis-backed store. Guarantees no oversell under
//! arbitrary concurrency by pushing every read-modify-write into a single
//! atomic Lua script.

mod conn;
mod error;
mod keys;
mod ops;
mod scripts;

pub use conn::InventoryStore;
pub use error::map_script_error;
pub use ops::{ReleaseOutcome, ReserveOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    async fn store() -> InventoryStore {
        let url = std::env::var("TEST_REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());
        InventoryStore::connect(&url).await.expect("redis connection for inventory tests")
    }

    #[tokio::test]
    #[ignore = "requires a live redis instance"]
    async fn reserve_then_release_restores_counters() {
        let store = store().await;
        let show_id = Uuid::new_v4();
        let zone_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let booking_id = Uuid::new_v4();

        store.seed_availability(show_id, zone_id, 10).await.unwrap();

        let reserved = store
            .reserve(
                show_id,
                zone_id,
                user_id,
                event_id,
                booking_id,
                3,
                Decimal::new(2500, 2),
                4,
                chrono::Duration::seconds(60),
            )
            .await
            .unwrap();
        assert_eq!(reserved.remaining, 7);
        assert_eq!(reserved.new_userres, 3);

        let released = store
            .release(booking_id, user_id, show_id, zone_id, event_id, 120)
            .await
            .unwrap();
        assert_eq!(released.new_available, 10);
        assert_eq!(released.new_userres, 0);
    }

    #[tokio::test]
    #[ignore = "requires a live redis instance"]
    async fn repeat_reserve_is_already_reserved() {
        let store = store().await;
        let show_id = Uuid::new_v4();
        let zone_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let booking_id = Uuid::new_v4();

        store.seed_availability(show_id, zone_id, 10).await.unwrap();

        store
            .reserve(show_id, zone_id, user_id, event_id, booking_id, 1, Decimal::ONE, 4, chrono::Duration::seconds(60))
            .await
            .unwrap();

        let second = store
            .reserve(show_id, zone_id, user_id, event_id, booking_id, 1, Decimal::ONE, 4, chrono::Duration::seconds(60))
            .await;

        assert!(matches!(second, Err(turnstile_types::AppError::AlreadyReserved)));
    }

    #[tokio::test]
    #[ignore = "requires a live redis instance"]
    async fn insufficient_stock_leaves_counters_untouched() {
        let store = store().await;
        let show_id = Uuid::new_v4();
        let zone_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();

        store.seed_availability(show_id, zone_id, 2).await.unwrap();

        let err = store
            .reserve(show_id, zone_id, user_id, event_id, Uuid::new_v4(), 5, Decimal::ONE, 10, chrono::Duration::seconds(60))
            .await
            .unwrap_err();

        assert!(matches!(err, turnstile_types::AppError::InsufficientStock { available: 2, .. }));
        assert_eq!(store.peek_available(show_id, zone_id).await.unwrap(), Some(2));
    }

    /// spec.md §8 scenario 3: `max_per_user=4`; 3 then 2 exceeds the cap,
    /// but releasing the first reservation makes room again.
    #[tokio::test]
    #[ignore = "requires a live redis instance"]
    async fn per_user_cap_is_enforced_and_releases_free_it() {
        let store = store().await;
        let show_id = Uuid::new_v4();
        let zone_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let b1 = Uuid::new_v4();

        store.seed_availability(show_id, zone_id, 100).await.unwrap();

        store
            .reserve(show_id, zone_id, user_id, event_id, b1, 3, Decimal::ONE, 4, chrono::Duration::seconds(60))
            .await
            .unwrap();

        let over_cap = store
            .reserve(show_id, zone_id, user_id, event_id, Uuid::new_v4(), 2, Decimal::ONE, 4, chrono::Duration::seconds(60))
            .await;
        assert!(matches!(over_cap, Err(turnstile_types::AppError::UserLimitExceeded { cap: 4, held: 3 })));

        store.release(b1, user_id, show_id, zone_id, event_id, 120).await.unwrap();

        let after_release = store
            .reserve(show_id, zone_id, user_id, event_id, Uuid::new_v4(), 2, Decimal::ONE, 4, chrono::Duration::seconds(60))
            .await;
        assert!(after_release.is_ok());
    }
}
