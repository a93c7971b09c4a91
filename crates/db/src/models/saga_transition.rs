use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use turnstile_types::enums::SagaState;
use uuid::Uuid;

/// Append-only audit row (spec.md §4.4 "Transition audit").
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SagaTransition {
    pub id: Uuid,
    pub saga_id: Uuid,
    pub from_state: Option<SagaState>,
    pub to_state: SagaState,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}
