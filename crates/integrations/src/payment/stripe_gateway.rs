use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use turnstile_types::{AppError, Result};
use uuid::Uuid;

use super::gateway::{PaymentGateway, PaymentIntent, WebhookOutcome};

/// Real gateway backed by Stripe (spec.md §4.5). The wire protocol itself
/// is out of scope (§1); this is the thin capability boundary the Saga
/// Orchestrator's `RESERVED → PAID` step talks to.
pub struct StripeGateway {
    client: stripe::Client,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(secret_key: &str, webhook_secret: &str) -> Self {
        Self {
            client: stripe::Client::new(secret_key),
            webhook_secret: webhook_secret.to_string(),
        }
    }
}

fn to_minor_units(amount: Decimal, currency: &str) -> i64 {
    let exponent = zero_decimal_currency(currency).then_some(0).unwrap_or(2);
    let scaled = amount * Decimal::from(10i64.pow(exponent));
    scaled.round().try_into().unwrap_or(0)
}

fn zero_decimal_currency(currency: &str) -> bool {
    matches!(currency.to_uppercase().as_str(), "JPY" | "KRW" | "VND")
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_intent(
        &self,
        booking_id: Uuid,
        amount: Decimal,
        currency: &str,
    ) -> Result<PaymentIntent> {
        let stripe_currency = stripe::Currency::from_str(&currency.to_lowercase())
            .map_err(|_| AppError::Validation(format!("unsupported currency: {currency}")))?;

        let mut params =
            stripe::CreatePaymentIntent::new(to_minor_units(amount, currency), stripe_currency);
        params.metadata = Some(HashMap::from([(
            "booking_id".to_string(),
            booking_id.to_string(),
        )]));

        let intent = stripe::PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| AppError::PaymentFailed(e.to_string()))?;

        Ok(PaymentIntent {
            payment_id: intent.id.to_string(),
            client_secret: intent.client_secret.unwrap_or_default(),
            amount,
            currency: currency.to_string(),
        })
    }

    async fn get_transaction(&self, payment_id: &str) -> Result<PaymentIntent> {
        let id = payment_id
            .parse::<stripe::PaymentIntentId>()
            .map_err(|_| AppError::BadRequest("invalid payment id".into()))?;

        let intent = stripe::PaymentIntent::retrieve(&self.client, &id, &[])
            .await
            .map_err(|e| AppError::PaymentFailed(e.to_string()))?;

        let currency = intent.currency.to_string();
        let exponent = if zero_decimal_currency(&currency) { 0 } else { 2 };
        let amount = Decimal::new(intent.amount, exponent);

        Ok(PaymentIntent {
            payment_id: intent.id.to_string(),
            client_secret: intent.client_secret.unwrap_or_default(),
            amount,
            currency,
        })
    }

    async fn refund(&self, payment_id: &str) -> Result<()> {
        let intent_id = payment_id
            .parse::<stripe::PaymentIntentId>()
            .map_err(|_| AppError::BadRequest("invalid payment id".into()))?;

        let mut params = stripe::CreateRefund::new();
        params.payment_intent = Some(intent_id);

        stripe::Refund::create(&self.client, params)
            .await
            .map_err(|e| AppError::PaymentFailed(e.to_string()))?;
        Ok(())
    }

    fn verify_webhook(&self, payload: &[u8], signature: &str) -> Result<WebhookOutcome> {
        let payload_str = std::str::from_utf8(payload)
            .map_err(|_| AppError::BadRequest("webhook payload is not valid utf-8".into()))?;

        let event = stripe::Webhook::construct_event(payload_str, signature, &self.webhook_secret)
            .map_err(|e| AppError::BadRequest(format!("invalid webhook signature: {e}")))?;

        let outcome = match event.type_ {
            stripe::EventType::PaymentIntentSucceeded => match event.data.object {
                stripe::EventObject::PaymentIntent(pi) => WebhookOutcome::Succeeded {
                    payment_id: pi.id.to_string(),
                },
                _ => WebhookOutcome::Ignored,
            },
            stripe::EventType::PaymentIntentPaymentFailed => match event.data.object {
                stripe::EventObject::PaymentIntent(pi) => WebhookOutcome::Failed {
                    payment_id: pi.id.to_string(),
                    reason: pi
                        .last_payment_error
                        .and_then(|e| e.message)
                        .unwrap_or_else(|| "payment failed".to_string()),
                },
                _ => WebhookOutcome::Ignored,
            },
            stripe::EventType::PaymentIntentCanceled => match event.data.object {
                stripe::EventObject::PaymentIntent(pi) => WebhookOutcome::Failed {
                    payment_id: pi.id.to_string(),
                    reason: "canceled".to_string(),
                },
                _ => WebhookOutcome::Ignored,
            },
            _ => WebhookOutcome::Ignored,
        };

        Ok(outcome)
    }
}
