use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::Serialize;
use turnstile_types::{AppError, Result};
use uuid::Uuid;

use crate::conn::QueueStore;
use crate::error::map_script_error;
use crate::keys;
use crate::scripts;

#[derive(Debug, Clone, Copy)]
pub struct JoinOutcome {
    pub position: i64,
    pub total: i64,
}

#[derive(Debug, Clone)]
pub enum PositionOutcome {
    Waiting { position: i64, total: i64 },
    Ready { queue_pass: String, expires_at: DateTime<Utc> },
}

#[derive(Debug, Clone)]
pub struct ReleasedPass {
    pub user_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassNotification {
    pub queue_pass: String,
    pub expires_at: DateTime<Utc>,
}

impl QueueStore {
    /// Join(event_id, user_id) — spec.md §4.2. `now` supplies the monotonic
    /// `joined_ts` score so a retried join never perturbs a user's position.
    pub async fn join(
        &self,
        event_id: Uuid,
        user_id: Uuid,
        capacity: i64,
        is_open: bool,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome> {
        let result: redis::Value = redis::Script::new(scripts::JOIN)
            .key(keys::queue_set(event_id))
            .arg(user_id.to_string())
            .arg(now.timestamp_millis())
            .arg(capacity)
            .arg(if is_open { "1" } else { "0" })
            .invoke_async(&mut self.conn())
            .await
            .map_err(map_script_error)?;

        let (rank, total): (i64, i64) = redis::from_redis_value(&result)
            .map_err(|e| AppError::Internal(format!("malformed join reply: {e}")))?;

        Ok(JoinOutcome {
            position: rank,
            total,
        })
    }

    /// GetPosition(event_id, user_id) — spec.md §4.2. Checks for an
    /// already-minted pass first; otherwise reports live queue rank.
    pub async fn position(&self, event_id: Uuid, user_id: Uuid) -> Result<PositionOutcome> {
        let mut conn = self.conn();

        let pass: Option<String> = conn
            .get(keys::pass_key(event_id, user_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        if let Some(token) = pass {
            let ttl: i64 = conn
                .ttl(keys::pass_key(event_id, user_id))
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
            let expires_at = Utc::now() + chrono::Duration::seconds(ttl.max(0));
            return Ok(PositionOutcome::Ready {
                queue_pass: token,
                expires_at,
            });
        }

        let rank: Option<i64> = conn
            .zrank(keys::queue_set(event_id), user_id.to_string())
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        match rank {
            Some(r) => {
                let total: i64 = conn
                    .zcard(keys::queue_set(event_id))
                    .await
                    .map_err(|e| AppError::Redis(e.to_string()))?;
                Ok(PositionOutcome::Waiting {
                    position: r + 1,
                    total,
                })
            }
            None => Err(AppError::NotInQueue),
        }
    }

    /// Leave(event_id, user_id) — no-op if absent. Passes are not revoked.
    pub async fn leave(&self, event_id: Uuid, user_id: Uuid) -> Result<()> {
        let _: i64 = self
            .conn()
            .zrem(keys::queue_set(event_id), user_id.to_string())
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }

    /// Coordinates the leaky-bucket admission rate across replicated
    /// workers via a counter reset on an integer-second boundary (spec.md
    /// §4.2 "Admission rate"). Returns how many admits this caller may
    /// perform in the current tick.
    pub async fn govern_admission(&self, event_id: Uuid, release_rate: i64, desired: i64) -> Result<i64> {
        let now_secs = Utc::now().timestamp();
        let granted: i64 = redis::Script::new(scripts::GOVERN_ADMISSION)
            .key(keys::budget(event_id, now_secs))
            .arg(release_rate)
            .arg(desired)
            .invoke_async(&mut self.conn())
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(granted)
    }

    /// Release(event_id, batch_size) — background operation (C6). Pops the
    /// head of the queue up to `batch_size`, mints a pass per popped user
    /// with TTL `pass_validity`, and publishes a per-user notification.
    pub async fn release_batch(
        &self,
        event_id: Uuid,
        batch_size: i64,
        pass_ttl: chrono::Duration,
    ) -> Result<Vec<ReleasedPass>> {
        if batch_size <= 0 {
            return Ok(Vec::new());
        }

        let popped: Vec<(String, f64)> = self
            .conn()
            .zpopmin(keys::queue_set(event_id), batch_size as isize)
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        if popped.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let expires_at = now + pass_ttl;
        let mut released = Vec::with_capacity(popped.len());

        let mut pipe = redis::pipe();
        pipe.atomic();
        for (user_id_raw, _score) in &popped {
            let Ok(user_id) = Uuid::parse_str(user_id_raw) else {
                continue;
            };
            let token = Uuid::new_v4().to_string();
            let notification = PassNotification {
                queue_pass: token.clone(),
                expires_at,
            };
            let payload = serde_json::to_string(&notification)
                .map_err(|e| AppError::Internal(format!("failed to serialize pass notification: {e}")))?;

            pipe.set_ex(keys::pass_key(event_id, user_id), token.clone(), pass_ttl.num_seconds() as u64)
                .ignore();
            pipe.sadd(keys::passes_index(event_id), user_id.to_string()).ignore();
            pipe.publish(keys::pass_channel(event_id, user_id), payload).ignore();

            released.push(ReleasedPass {
                user_id,
                token,
                expires_at,
            });
        }

        let _: () = pipe
            .query_async(&mut self.conn())
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        Ok(released)
    }

    /// ConsumePass(event_id, user_id, token) — spec.md §4.2. Called from the
    /// reserve path; atomically verifies and deletes the pass.
    pub async fn consume_pass(&self, event_id: Uuid, user_id: Uuid, token: &str) -> Result<()> {
        let _: i64 = redis::Script::new(scripts::CONSUME_PASS)
            .key(keys::pass_key(event_id, user_id))
            .key(keys::passes_index(event_id))
            .arg(user_id.to_string())
            .arg(token)
            .invoke_async(&mut self.conn())
            .await
            .map_err(map_script_error)?;
        Ok(())
    }

    /// Queue-pass sweeper support (spec.md §4.6 "Queue-pass sweeper"):
    /// drops index members whose backing key has already expired.
    pub async fn sweep_expired_passes(&self, event_id: Uuid) -> Result<u64> {
        let mut conn = self.conn();
        let members: Vec<String> = conn
            .smembers(keys::passes_index(event_id))
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;

        let mut removed = 0u64;
        for member in members {
            let Ok(user_id) = Uuid::parse_str(&member) else {
                continue;
            };
            let exists: bool = conn
                .exists(keys::pass_key(event_id, user_id))
                .await
                .map_err(|e| AppError::Redis(e.to_string()))?;
            if !exists {
                let _: i64 = conn
                    .srem(keys::passes_index(event_id), &member)
                    .await
                    .map_err(|e| AppError::Redis(e.to_string()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}
