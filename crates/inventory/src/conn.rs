use redis::aio::ConnectionManager;
use turnstile_types::{AppError, Result};

/// Shared Redis handle for the inventory engine.
///
/// `ConnectionManager` multiplexes over a single connection and reconnects
/// transparently, so this can be cloned freely and handed to every worker
/// and handler that needs to touch availability counters.
#[derive(Clone)]
pub struct InventoryStore {
    conn: ConnectionManager,
}

impl InventoryStore {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| AppError::Internal(format!("invalid redis url: {e}")))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| AppError::Redis(e.to_string()))?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> ConnectionManager {
        self.conn.clone()
    }
}
