use async_trait::async_trait;
use rust_decimal::Decimal;
use turnstile_types::Result;

/// A gateway-issued payment intent, linked to a booking (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub payment_id: String,
    pub client_secret: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Outcome of a webhook event, after signature verification and
/// deduplication, ready to drive a saga transition.
#[derive(Debug, Clone)]
pub enum WebhookOutcome {
    Succeeded { payment_id: String },
    Failed { payment_id: String, reason: String },
    /// An event this coordinator doesn't act on (e.g. a duplicate delivery
    /// or an event kind outside the booking flow).
    Ignored,
}

/// Capability boundary for the payment gateway (spec.md §4.5: `{CreateIntent,
/// ConfirmIntent, Refund, GetTransaction}`; wire protocol is out of scope,
/// §1).
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(
        &self,
        booking_id: uuid::Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent>;

    async fn get_transaction(&self, payment_id: &str) -> Result<PaymentIntent>;

    async fn refund(&self, payment_id: &str) -> Result<()>;

    /// Verifies the webhook signature and classifies the event. Does not
    /// touch the saga or booking store — the coordinator does that with the
    /// result (spec.md §4.5).
    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookOutcome>;
}
