use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use rust_decimal::Decimal;
use turnstile_types::{AppError, Result};
use uuid::Uuid;

use crate::conn::InventoryStore;
use crate::error::map_script_error;
use crate::keys;
use crate::scripts;

#[derive(Debug, Clone, Copy)]
pub struct ReserveOutcome {
    pub remaining: i64,
    pub new_userres: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct ReleaseOutcome {
    pub new_available: i64,
    pub new_userres: i64,
}

#[allow(clippy::too_many_arguments)]
impl InventoryStore {
    /// Reserve(show_id, zone_id, user_id, event_id, booking_id, quantity,
    /// unit_price, max_per_user, ttl) — spec.md §4.1.
    pub async fn reserve(
        &self,
        show_id: Uuid,
        zone_id: Uuid,
        user_id: Uuid,
        event_id: Uuid,
        booking_id: Uuid,
        quantity: i64,
        unit_price: Decimal,
        max_per_user: i32,
        ttl: chrono::Duration,
    ) -> Result<ReserveOutcome> {
        let now = Utc::now();
        let expires_at = now + ttl;
        let userres_ttl = ttl.num_seconds() + 60;

        let result: redis::Value = redis::Script::new(scripts::RESERVE)
            .key(keys::avail(show_id, zone_id))
            .key(keys::userres(user_id, event_id))
            .key(keys::reservation(booking_id))
            .arg(quantity)
            .arg(max_per_user)
            .arg(userres_ttl)
            .arg(booking_id.to_string())
            .arg(user_id.to_string())
            .arg(zone_id.to_string())
            .arg(event_id.to_string())
            .arg(show_id.to_string())
            .arg(unit_price.to_string())
            .arg(now.to_rfc3339())
            .arg(expires_at.to_rfc3339())
            .arg(ttl.num_seconds())
            .invoke_async(&mut self.conn())
            .await
            .map_err(|e| match map_script_error(e) {
                AppError::UserLimitExceeded { held, .. } => AppError::UserLimitExceeded { cap: max_per_user, held },
                other => other,
            })?;

        let (remaining, new_userres): (i64, i64) = redis::from_redis_value(&result)
            .map_err(|e| AppError::Internal(format!("malformed reserve reply: {e}")))?;

        Ok(ReserveOutcome {
            remaining,
            new_userres,
        })
    }

    /// Release(booking_id, user_id) — spec.md §4.1.
    pub async fn release(
        &self,
        booking_id: Uuid,
        user_id: Uuid,
        show_id: Uuid,
        zone_id: Uuid,
        event_id: Uuid,
        userres_ttl_secs: i64,
    ) -> Result<ReleaseOutcome> {
        let result: redis::Value = redis::Script::new(scripts::RELEASE)
            .key(keys::reservation(booking_id))
            .key(keys::avail(show_id, zone_id))
            .key(keys::userres(user_id, event_id))
            .arg(booking_id.to_string())
            .arg(user_id.to_string())
            .arg(userres_ttl_secs)
            .invoke_async(&mut self.conn())
            .await
            .map_err(map_script_error)?;

        let (new_available, new_userres): (i64, i64) = redis::from_redis_value(&result)
            .map_err(|e| AppError::Internal(format!("malformed release reply: {e}")))?;

        Ok(ReleaseOutcome {
            new_available,
            new_userres,
        })
    }

    /// Consume(booking_id) — marks the reservation consumed. `available`
    /// is untouched; the reserve-time decrement already accounts for the
    /// sale (spec.md §4.1).
    pub async fn consume(&self, booking_id: Uuid) -> Result<()> {
        let _: i64 = redis::Script::new(scripts::CONSUME)
            .key(keys::reservation(booking_id))
            .invoke_async(&mut self.conn())
            .await
            .map_err(map_script_error)?;
        Ok(())
    }

    /// Bare read of `available` for the sold-out fast path (spec.md §4.1
    /// "Sold-out fast path"). Does not touch the relational store.
    pub async fn peek_available(&self, show_id: Uuid, zone_id: Uuid) -> Result<Option<i64>> {
        let v: Option<i64> = self
            .conn()
            .get(keys::avail(show_id, zone_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(v)
    }

    /// Seeds (or resets) a zone's availability counter. Used by the booking
    /// store's zone mirror when upstream master data changes; not a public
    /// API endpoint.
    pub async fn seed_availability(&self, show_id: Uuid, zone_id: Uuid, total_seats: i64) -> Result<()> {
        let _: () = self
            .conn()
            .set(keys::avail(show_id, zone_id), total_seats)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }

    pub async fn reservation_expiry(&self, booking_id: Uuid) -> Result<Option<DateTime<Utc>>> {
        let raw: Option<String> = self
            .conn()
            .hget(keys::reservation(booking_id), "expires_at")
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(raw.and_then(|s| DateTime::parse_from_rfc3339(&s).ok().map(|dt| dt.with_timezone(&Utc))))
    }
}
