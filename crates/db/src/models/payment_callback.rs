use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Webhook callback dedup row, keyed `(payment_id, event_kind)` (spec.md
/// §4.5: "Callbacks are deduplicated by (payment_id, event_kind)").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentCallback {
    pub id: Uuid,
    pub payment_id: String,
    pub event_kind: String,
    pub received_at: DateTime<Utc>,
}
