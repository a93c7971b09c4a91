use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `POST /queue/join` request body (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
pub struct JoinQueueRequest {
    pub event_id: Uuid,
}

/// `DELETE /queue/leave` request body (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
pub struct LeaveQueueRequest {
    pub event_id: Uuid,
}

/// `POST /queue/join` 201 response (spec.md §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueJoinResponse {
    pub position: u64,
    pub total: u64,
    pub estimated_wait_secs: u64,
}

/// `GET /queue/position/:event_id` 200 response (spec.md §6). Either the
/// user is still waiting (`position`/`total` set, `is_ready=false`) or
/// already holds a pass (`is_ready=true`, `queue_pass`/`expires_at` set).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuePositionResponse {
    pub is_ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_pass: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// SSE `position` event payload (spec.md §6 "SSE event format").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuePositionEvent {
    pub event_id: Uuid,
    #[serde(flatten)]
    pub position: QueuePositionResponse,
}

/// SSE `error` event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueErrorEvent {
    pub code: String,
    pub message: String,
}
