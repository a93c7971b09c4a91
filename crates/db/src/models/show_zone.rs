use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// External identity, mirrored read-only (spec.md §3 "Event"; out of scope
/// for CRUD, see SPEC_FULL §2).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub booking_opens_at: DateTime<Utc>,
    pub booking_closes_at: DateTime<Utc>,
    pub max_per_user: i32,
    /// Waiting-room capacity (spec.md §4.2 "Data").
    pub queue_capacity: i32,
    /// Admissions per second the queue releases into the booking path
    /// (spec.md §4.2 "Admission rate").
    pub release_rate: i32,
    /// Ceiling on how long a queued user may wait before the pass TTL
    /// governs eviction instead (spec.md §4.2 "Data", `max_wait`).
    pub max_wait_secs: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Whether the waiting room (and booking) is currently open (spec.md
    /// §4.2 "Data", `open_at`: carried by `booking_opens_at`/`_closes_at`).
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        now >= self.booking_opens_at && now < self.booking_closes_at
    }
}

/// A dated instance of an event (spec.md §3 "Show").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Show {
    pub id: Uuid,
    pub event_id: Uuid,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub total_capacity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Price tier within a show (spec.md §3 "Zone"). `total_seats` seeds the
/// inventory engine's counter at show setup; it is not the authoritative
/// availability figure once booking opens (spec.md §9, "Ownership of
/// inventory truth").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Zone {
    pub id: Uuid,
    pub show_id: Uuid,
    pub price: Decimal,
    pub currency: String,
    pub total_seats: i32,
    pub sold_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
