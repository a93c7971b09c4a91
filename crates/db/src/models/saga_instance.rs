use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use turnstile_types::enums::SagaState;
use uuid::Uuid;

/// Persisted saga row (spec.md §3 "Saga Instance"). `version` is an
/// optimistic-concurrency counter: every transition does `UPDATE ... WHERE
/// id = $1 AND version = $2`, treating zero rows affected as a stale write.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SagaInstance {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub state: SagaState,
    pub previous_state: Option<SagaState>,
    pub reservation_id: Option<Uuid>,
    pub payment_id: Option<String>,
    pub confirmation_id: Option<String>,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub data: Value,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}
