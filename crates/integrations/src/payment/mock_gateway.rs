use async_trait::async_trait;
use rust_decimal::Decimal;
use turnstile_types::Result;
use uuid::Uuid;

use super::gateway::{PaymentGateway, PaymentIntent, WebhookOutcome};

/// Always-succeeds gateway for local development and tests, mirroring the
/// real gateway's interface without touching the network.
#[derive(Debug, Default, Clone)]
pub struct MockGateway;

impl MockGateway {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_intent(
        &self,
        booking_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent> {
        let payment_id = format!("mock_pi_{booking_id}");
        tracing::info!(%booking_id, %amount, currency, "mock gateway created payment intent");
        Ok(PaymentIntent {
            payment_id: payment_id.clone(),
            client_secret: format!("{payment_id}_secret"),
            amount,
            currency: currency.to_string(),
        })
    }

    async fn get_transaction(&self, payment_id: &str) -> Result<PaymentIntent> {
        Ok(PaymentIntent {
            payment_id: payment_id.to_string(),
            client_secret: format!("{payment_id}_secret"),
            amount: Decimal::ZERO,
            currency: "usd".to_string(),
        })
    }

    async fn refund(&self, payment_id: &str) -> Result<()> {
        tracing::info!(payment_id, "mock gateway processed refund");
        Ok(())
    }

    fn verify_webhook(&self, payload: &[u8], _signature: &str) -> Result<WebhookOutcome> {
        let text = String::from_utf8_lossy(payload);
        if text.contains("\"failed\"") {
            Ok(WebhookOutcome::Failed {
                payment_id: extract_payment_id(&text),
                reason: "mock failure".to_string(),
            })
        } else {
            Ok(WebhookOutcome::Succeeded {
                payment_id: extract_payment_id(&text),
            })
        }
    }
}

fn extract_payment_id(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("payment_id").and_then(|p| p.as_str()).map(str::to_string))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_intent_echoes_amount_and_currency() {
        let gateway = MockGateway::new();
        let intent = gateway
            .create_intent(Uuid::new_v4(), Decimal::new(2500, 2), "usd")
            .await
            .unwrap();
        assert_eq!(intent.amount, Decimal::new(2500, 2));
        assert_eq!(intent.currency, "usd");
    }

    #[test]
    fn verify_webhook_classifies_success_and_failure() {
        let gateway = MockGateway::new();
        let success = gateway
            .verify_webhook(br#"{"payment_id":"pi_1","status":"succeeded"}"#, "sig")
            .unwrap();
        assert!(matches!(success, WebhookOutcome::Succeeded { .. }));

        let failure = gateway
            .verify_webhook(br#"{"payment_id":"pi_2","status":"failed"}"#, "sig")
            .unwrap();
        assert!(matches!(failure, WebhookOutcome::Failed { .. }));
    }
}
