use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

/// Outbound events the orchestrator emits on terminal transitions (spec.md
/// §4.4 `PAID → CONFIRMED`: "emit a `payment.success` event on the outbound
/// event bus"). The wire format of the bus itself is out of scope (§1,
/// "Out of scope: ... analytics, and dashboards"); this crate only defines
/// the capability boundary and a default sink for environments that don't
/// wire one up yet.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DomainEvent {
    PaymentSuccess {
        booking_id: Uuid,
        saga_id: Uuid,
        user_id: Uuid,
        confirmation_code: String,
        amount: Decimal,
        currency: String,
        at: DateTime<Utc>,
    },
    BookingFailed {
        booking_id: Uuid,
        saga_id: Uuid,
        user_id: Uuid,
        reason: String,
        at: DateTime<Utc>,
    },
    RefundRequested {
        booking_id: Uuid,
        saga_id: Uuid,
        payment_id: String,
        at: DateTime<Utc>,
    },
}

/// Capability boundary for the outbound event bus (spec.md §1, "Out of
/// scope ... via §6 interfaces only"). The orchestrator publishes through
/// this trait; a production deployment swaps in a real bus the same way
/// `PaymentGateway`/`IdentityVerifier` are swapped.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: DomainEvent);
}

/// Default sink: structured-logs the event. Sufficient for local
/// development and for deployments that consume events straight out of the
/// log pipeline rather than a dedicated bus.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEventSink;

#[async_trait]
impl EventSink for TracingEventSink {
    async fn publish(&self, event: DomainEvent) {
        tracing::info!(event = ?event, "domain event");
    }
}
