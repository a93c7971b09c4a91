use std::sync::Arc;

use turnstile_core::SagaOrchestrator;
use turnstile_db::PgPool;
use turnstile_integrations::identity::IdentityVerifier;
use turnstile_queue::QueueStore;
use turnstile_types::Config;

use crate::middleware::RateLimiter;

/// Shared handler state (spec.md §4.7 "Admission & API Surface"). Bundles
/// the saga orchestrator used by the booking and webhook handlers with the
/// queue store used directly by the queue endpoints, plus the rate-limit
/// and auth collaborators every handler sits behind.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub queue: QueueStore,
    pub orchestrator: Arc<SagaOrchestrator>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub rate_limiter: RateLimiter,
    pub config: Config,
}
