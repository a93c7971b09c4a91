use redis::aio::ConnectionManager;
use turnstile_types::AppError;

#[derive(Clone)]
pub struct QueueStore {
    conn: ConnectionManager,
    client: redis::Client,
}

impl QueueStore {
    pub async fn connect(redis_url: &str) -> turnstile_types::Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Internal(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(Self { conn, client })
    }

    pub(crate) fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }

    /// A dedicated (non-multiplexed) connection for Pub/Sub subscribe
    /// (spec.md §4.2/§6 "SSE"): `ConnectionManager` does not support
    /// entering subscriber mode, so the SSE handler needs its own socket.
    pub async fn pubsub(&self) -> turnstile_types::Result<redis::aio::PubSub> {
        self.client
            .get_async_pubsub()
            .await
            .map_err(|e| AppError::Redis(e.to_string()))
    }

    /// Readiness probe — a single round trip against the multiplexed connection.
    pub async fn ping(&self) -> turnstile_types::Result<()> {
        redis::cmd("PING")
            .query_async::<String>(&mut self.conn())
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(())
    }
}
