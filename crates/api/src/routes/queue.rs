use std::convert::Infallible;
use std::time::Duration;

use async_stream::stream;
use axum::extract::{Path, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use futures_util::{Stream, StreamExt};
use turnstile_db::queries::show_zones;
use turnstile_queue::PositionOutcome;
use turnstile_types::api::queue::{
    JoinQueueRequest, LeaveQueueRequest, QueueErrorEvent, QueueJoinResponse, QueuePositionEvent,
    QueuePositionResponse,
};
use turnstile_types::AppError;
use uuid::Uuid;

use crate::middleware::AuthUser;
use crate::response::{created, ok, ApiError};
use crate::state::AppState;

const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// `POST /queue/join` (spec.md §6).
pub async fn join(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<JoinQueueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let event = event_config(&state, payload.event_id).await?;
    let now = Utc::now();

    let outcome = state
        .queue
        .join(payload.event_id, claims.user_id, event.queue_capacity as i64, event.is_open(now), now)
        .await?;

    let estimated_wait_secs = if event.release_rate > 0 {
        (outcome.position as u64) / (event.release_rate as u64)
    } else {
        0
    };

    Ok(created(QueueJoinResponse {
        position: outcome.position as u64,
        total: outcome.total as u64,
        estimated_wait_secs,
    }))
}

/// `GET /queue/position/:event_id` (spec.md §6).
pub async fn position(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let response = read_position(&state, event_id, claims.user_id).await?;
    Ok(ok(response))
}

/// `DELETE /queue/leave` (spec.md §6).
pub async fn leave(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<LeaveQueueRequest>,
) -> Result<impl IntoResponse, ApiError> {
    // Leave(event_id, user_id) is defined as a no-op if the caller is
    // already absent (spec.md §4.2); NOT_IN_QUEUE is only surfaced by
    // checking position first, matching the endpoint's documented 404.
    read_position(&state, payload.event_id, claims.user_id).await?;
    state.queue.leave(payload.event_id, claims.user_id).await?;
    Ok(ok(()))
}

/// `GET /queue/position/:event_id/stream` (spec.md §4.2 "Streaming", §6).
///
/// Subscribes to the per-user pass channel so a release is pushed the
/// instant it happens, and falls back to polling every 15s in case the
/// subscribe races the publish. The stream ends once a pass is ready or
/// the event's `max_wait_secs` ceiling elapses, whichever comes first.
pub async fn position_stream(
    AuthUser(claims): AuthUser,
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<
    Sse<std::pin::Pin<Box<dyn Stream<Item = Result<SseEvent, Infallible>> + Send>>>,
    ApiError,
> {
    let user_id = claims.user_id;
    let snapshot = read_position(&state, event_id, user_id).await?;

    if snapshot.is_ready {
        let event = position_event(event_id, snapshot);
        let stream = stream! { yield Ok(event); };
        return Ok(Sse::new(stream.boxed()).keep_alive(keep_alive()));
    }

    let mut pubsub = state.queue.pubsub().await?;
    let channel = turnstile_queue::pass_channel(event_id, user_id);
    pubsub.subscribe(&channel).await.map_err(|e| ApiError(AppError::Redis(e.to_string())))?;

    let ttl_ceiling = state.config.queue_pass_ttl();

    let stream = stream! {
        yield Ok(position_event(event_id, snapshot));

        let mut messages = pubsub.on_message();
        let mut ticker = tokio::time::interval(POLL_INTERVAL);
        ticker.tick().await; // first tick fires immediately, skip it

        let deadline = tokio::time::sleep(ttl_ceiling);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                _ = &mut deadline => break,
                msg = messages.next() => {
                    if msg.is_none() {
                        break;
                    }
                    match read_position(&state, event_id, user_id).await {
                        Ok(position) => yield Ok(position_event(event_id, position)),
                        Err(err) => yield Ok(error_event(&err)),
                    }
                    break;
                }
                _ = ticker.tick() => {
                    match read_position(&state, event_id, user_id).await {
                        Ok(position) => {
                            let ready = position.is_ready;
                            yield Ok(position_event(event_id, position));
                            if ready {
                                break;
                            }
                        }
                        Err(err) => {
                            yield Ok(error_event(&err));
                            break;
                        }
                    }
                }
            }
        }
    };

    Ok(Sse::new(stream.boxed()).keep_alive(keep_alive()))
}

fn keep_alive() -> KeepAlive {
    KeepAlive::new().interval(POLL_INTERVAL).text(":keepalive")
}

fn position_event(event_id: Uuid, position: QueuePositionResponse) -> SseEvent {
    let payload = QueuePositionEvent { event_id, position };
    SseEvent::default().event("position").json_data(&payload).unwrap_or_default()
}

fn error_event(err: &AppError) -> SseEvent {
    let payload = QueueErrorEvent { code: err.code().to_string(), message: err.to_string() };
    SseEvent::default().event("error").json_data(&payload).unwrap_or_default()
}

async fn read_position(state: &AppState, event_id: Uuid, user_id: Uuid) -> Result<QueuePositionResponse, AppError> {
    match state.queue.position(event_id, user_id).await? {
        PositionOutcome::Waiting { position, total } => Ok(QueuePositionResponse {
            is_ready: false,
            position: Some(position as u64),
            total: Some(total as u64),
            queue_pass: None,
            expires_at: None,
        }),
        PositionOutcome::Ready { queue_pass, expires_at } => Ok(QueuePositionResponse {
            is_ready: true,
            position: None,
            total: None,
            queue_pass: Some(queue_pass),
            expires_at: Some(expires_at),
        }),
    }
}

async fn event_config(state: &AppState, event_id: Uuid) -> Result<turnstile_db::models::Event, ApiError> {
    show_zones::find_event(&state.db, event_id)
        .await?
        .ok_or_else(|| ApiError(AppError::NotFound("event".to_string())))
}
