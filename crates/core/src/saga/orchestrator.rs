use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use turnstile_db::models::{Booking, SagaInstance, Show};
use turnstile_db::queries::{bookings, idempotency, payment_callbacks, reservations, sagas, show_zones};
use turnstile_db::PgPool;
use turnstile_inventory::InventoryStore;
use turnstile_integrations::payment::{PaymentGateway, WebhookOutcome};
use turnstile_queue::QueueStore;
use turnstile_types::api::bookings::{BookingResponse, CreateBookingResponse, PaymentIntentResponse};
use turnstile_types::enums::{BookingStatus, ReservationStatus, SagaState};
use turnstile_types::validation::validate_quantity;
use turnstile_types::{AppError, Config, Result};

use super::backoff;
use super::codes::generate_confirmation_code;
use super::events::{DomainEvent, EventSink};

/// Drives the booking saga (spec.md §4.4 "Saga Orchestrator"): reservation,
/// payment, confirmation, and their compensations, coordinating the
/// inventory engine, the queue manager's pass, the payment gateway, and the
/// durable booking/saga tables.
pub struct SagaOrchestrator {
    pool: PgPool,
    inventory: InventoryStore,
    queue: QueueStore,
    payments: Arc<dyn PaymentGateway>,
    events: Arc<dyn EventSink>,
    config: Config,
}

impl SagaOrchestrator {
    pub fn new(
        pool: PgPool,
        inventory: InventoryStore,
        queue: QueueStore,
        payments: Arc<dyn PaymentGateway>,
        events: Arc<dyn EventSink>,
        config: Config,
    ) -> Self {
        Self { pool, inventory, queue, payments, events, config }
    }

    /// `POST /bookings` entry point (spec.md §6). Validates the request,
    /// honors idempotency on `(idempotency_key, user_id)`, consumes the
    /// caller's queue pass, then drives `CREATED → RESERVED` and creates the
    /// payment intent.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_booking(
        &self,
        tenant_id: Uuid,
        user_id: Uuid,
        event_id: Uuid,
        show_id: Uuid,
        zone_id: Uuid,
        quantity: i32,
        idempotency_key: &str,
        queue_pass_token: &str,
    ) -> Result<CreateBookingResponse> {
        validate_quantity(quantity).map_err(AppError::BadRequest)?;

        if let Some(existing) =
            bookings::find_by_idempotency_key(&self.pool, idempotency_key, user_id).await?
        {
            return self.response_for_existing(&existing).await;
        }

        let event = show_zones::find_event(&self.pool, event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {event_id} not found")))?;
        let show = show_zones::find_show(&self.pool, show_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("show {show_id} not found")))?;
        let zone = show_zones::find_zone(&self.pool, zone_id)
            .await?
            .ok_or_else(|| AppError::ZoneNotFound(zone_id.to_string()))?;

        let now = Utc::now();
        if now < event.booking_opens_at || now > event.booking_closes_at {
            return Err(AppError::BadRequest("booking window is not open".to_string()));
        }

        // Consuming the pass before the durable insert means a caller who
        // crashes between these two lines loses their pass without a
        // booking — an accepted, narrow window (spec.md §5 "Cancellation &
        // timeouts"), not one this orchestrator tries to close.
        self.queue.consume_pass(event_id, user_id, queue_pass_token).await?;

        let booking = bookings::create_booking(
            &self.pool,
            tenant_id,
            user_id,
            event_id,
            show_id,
            zone_id,
            quantity,
            zone.price,
            &zone.currency,
            idempotency_key,
        )
        .await?;
        idempotency::record(&self.pool, idempotency_key, user_id, booking.id).await?;

        let saga = sagas::create(&self.pool, booking.id, event_id, user_id).await?;

        let reserved = self.reserve_step(&saga, &booking, &show, event.max_per_user).await?;
        let payment_intent = self.create_payment_intent(&reserved, &booking).await?;

        let reservation_expires_at = self.inventory.reservation_expiry(booking.id).await.unwrap_or(None);

        Ok(CreateBookingResponse {
            booking_id: booking.id,
            status: BookingStatus::Reserved,
            reservation_expires_at,
            payment_intent: Some(payment_intent),
        })
    }

    pub async fn get_booking(&self, booking_id: Uuid, requester: Uuid) -> Result<BookingResponse> {
        let booking = bookings::find_by_id(&self.pool, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
        if booking.user_id != requester {
            return Err(AppError::NotFound(format!("booking {booking_id} not found")));
        }
        Ok(to_booking_response(&booking))
    }

    pub async fn list_user_bookings(&self, user_id: Uuid) -> Result<Vec<BookingResponse>> {
        let rows = bookings::list_user_bookings(&self.pool, user_id).await?;
        Ok(rows.iter().map(to_booking_response).collect())
    }

    async fn response_for_existing(&self, booking: &Booking) -> Result<CreateBookingResponse> {
        let saga = sagas::find_by_booking_id(&self.pool, booking.id).await?;
        let reservation_expires_at = self.inventory.reservation_expiry(booking.id).await.unwrap_or(None);

        let payment_intent = match saga.as_ref().and_then(|s| s.payment_id.clone()) {
            Some(payment_id) => self.payments.get_transaction(&payment_id).await.ok().map(|pi| {
                PaymentIntentResponse {
                    payment_id: pi.payment_id,
                    client_secret: Some(pi.client_secret),
                    amount: pi.amount,
                    currency: pi.currency,
                }
            }),
            None => None,
        };

        Ok(CreateBookingResponse {
            booking_id: booking.id,
            status: booking.status,
            reservation_expires_at,
            payment_intent,
        })
    }

    /// `CREATED → RESERVED` (spec.md §4.4). Retries transient engine
    /// failures with jittered backoff up to `config.max_step_retries`;
    /// contended-resource outcomes (`INSUFFICIENT_STOCK`,
    /// `USER_LIMIT_EXCEEDED`) fail the saga immediately without retrying.
    async fn reserve_step(
        &self,
        saga: &SagaInstance,
        booking: &Booking,
        show: &Show,
        max_per_user: i32,
    ) -> Result<SagaInstance> {
        let ttl = chrono::Duration::seconds(self.config.reservation_ttl_secs);
        let mut attempt = 0u32;

        loop {
            let outcome = self
                .inventory
                .reserve(
                    show.id,
                    booking.zone_id,
                    booking.user_id,
                    booking.event_id,
                    booking.id,
                    booking.quantity as i64,
                    booking.unit_price,
                    max_per_user,
                    ttl,
                )
                .await;

            match outcome {
                Ok(_) | Err(AppError::AlreadyReserved) => {
                    reservations::create_if_missing(
                        &self.pool,
                        booking.id,
                        booking.user_id,
                        booking.zone_id,
                        show.id,
                        booking.event_id,
                        booking.quantity,
                        booking.unit_price,
                        Utc::now() + ttl,
                    )
                    .await?;

                    let updated = sagas::transition(
                        &self.pool,
                        saga.id,
                        saga.version,
                        SagaState::Reserved,
                        None,
                        None,
                        None,
                        None,
                        "reserve_ok",
                        None,
                    )
                    .await?;
                    bookings::mark_status(&self.pool, booking.id, BookingStatus::Reserved, None).await?;
                    return Ok(updated);
                }
                Err(err) if err.is_contention() => {
                    self.fail_from_created(saga, booking.id, &err.code().to_string()).await?;
                    return Err(err);
                }
                Err(err) => {
                    if attempt >= self.config.max_step_retries {
                        self.fail_from_created(saga, booking.id, "reserve step exhausted retries").await?;
                        return Err(AppError::Internal(format!(
                            "reserve step exhausted retries: {err}"
                        )));
                    }
                    sagas::bump_retry(&self.pool, saga.id).await?;
                    tokio::time::sleep(backoff::delay_for_attempt(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn fail_from_created(&self, saga: &SagaInstance, booking_id: Uuid, reason: &str) -> Result<()> {
        sagas::transition(
            &self.pool,
            saga.id,
            saga.version,
            SagaState::Failed,
            None,
            None,
            None,
            Some(reason),
            reason,
            None,
        )
        .await?;
        bookings::mark_status(&self.pool, booking_id, BookingStatus::Failed, None).await?;
        Ok(())
    }

    /// Creates the gateway payment intent for a `RESERVED` saga and parks
    /// it awaiting a webhook (spec.md §4.4 `RESERVED → PAID`). A gateway
    /// failure here already holds a live reservation, so it compensates
    /// (releases) before surfacing the error.
    async fn create_payment_intent(
        &self,
        saga: &SagaInstance,
        booking: &Booking,
    ) -> Result<PaymentIntentResponse> {
        match self.payments.create_intent(booking.id, booking.total_price, &booking.currency).await {
            Ok(intent) => {
                sagas::set_payment_id(&self.pool, saga.id, saga.version, &intent.payment_id).await?;
                Ok(PaymentIntentResponse {
                    payment_id: intent.payment_id,
                    client_secret: Some(intent.client_secret),
                    amount: intent.amount,
                    currency: intent.currency,
                })
            }
            Err(err) => {
                self.compensate_and_fail(saga, booking, SagaState::Failed, "PAYMENT_INTENT_FAILED").await?;
                Err(err)
            }
        }
    }

    /// Verifies and routes an inbound payment-gateway webhook (spec.md
    /// §4.5). Callback dedup happens per `(payment_id, event_kind)` before
    /// any saga transition is attempted.
    pub async fn handle_webhook(&self, payload: &[u8], signature: &str) -> Result<()> {
        match self.payments.verify_webhook(payload, signature)? {
            WebhookOutcome::Succeeded { payment_id } => self.on_payment_succeeded(&payment_id).await,
            WebhookOutcome::Failed { payment_id, reason } => self.on_payment_failed(&payment_id, &reason).await,
            WebhookOutcome::Ignored => Ok(()),
        }
    }

    async fn on_payment_succeeded(&self, payment_id: &str) -> Result<()> {
        if payment_callbacks::record_if_new(&self.pool, payment_id, "succeeded").await?.is_none() {
            return Ok(());
        }

        let Some(saga) = sagas::find_by_payment_id(&self.pool, payment_id).await? else {
            tracing::warn!(payment_id, "payment succeeded for an unknown saga");
            return Ok(());
        };
        if saga.state != SagaState::Reserved {
            return Ok(());
        }

        let updated = sagas::transition(
            &self.pool,
            saga.id,
            saga.version,
            SagaState::Paid,
            None,
            None,
            None,
            None,
            "payment_succeeded",
            None,
        )
        .await?;
        bookings::mark_status(&self.pool, saga.booking_id, BookingStatus::Paid, None).await?;

        self.confirm_step(&updated).await?;
        Ok(())
    }

    async fn on_payment_failed(&self, payment_id: &str, reason: &str) -> Result<()> {
        if payment_callbacks::record_if_new(&self.pool, payment_id, "failed").await?.is_none() {
            return Ok(());
        }

        let Some(saga) = sagas::find_by_payment_id(&self.pool, payment_id).await? else {
            tracing::warn!(payment_id, "payment failure for an unknown saga");
            return Ok(());
        };
        if saga.state != SagaState::Reserved {
            return Ok(());
        }

        let booking = bookings::find_by_id(&self.pool, saga.booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", saga.booking_id)))?;
        self.compensate_and_fail(&saga, &booking, SagaState::Failed, reason).await?;
        Ok(())
    }

    /// `PAID → CONFIRMED` (spec.md §4.4): consumes the reservation, marks
    /// `sold_count`, stamps a confirmation code, and emits `payment.success`.
    async fn confirm_step(&self, saga: &SagaInstance) -> Result<SagaInstance> {
        let booking = bookings::find_by_id(&self.pool, saga.booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", saga.booking_id)))?;

        self.inventory.consume(booking.id).await?;
        reservations::mark_status(&self.pool, booking.id, ReservationStatus::Consumed).await.ok();
        show_zones::increment_sold_count(&self.pool, booking.zone_id, booking.quantity).await?;

        let code = generate_confirmation_code();
        let updated = sagas::transition(
            &self.pool,
            saga.id,
            saga.version,
            SagaState::Confirmed,
            None,
            None,
            Some(&code),
            None,
            "payment_confirmed",
            None,
        )
        .await?;
        bookings::mark_status(&self.pool, booking.id, BookingStatus::Confirmed, Some(&code)).await?;

        self.events
            .publish(DomainEvent::PaymentSuccess {
                booking_id: booking.id,
                saga_id: saga.id,
                user_id: booking.user_id,
                confirmation_code: code,
                amount: booking.total_price,
                currency: booking.currency.clone(),
                at: Utc::now(),
            })
            .await;

        Ok(updated)
    }

    /// Releases the held reservation and drives the saga to `to_state`
    /// (spec.md §4.4 "Compensations"). Tolerates a reservation that was
    /// already released — compensation is at-least-once (spec.md §9
    /// "Idempotency of compensations"). When the saga was `PAID`, also
    /// emits a `RefundRequested` event since the gateway already captured
    /// funds.
    async fn compensate_and_fail(
        &self,
        saga: &SagaInstance,
        booking: &Booking,
        to_state: SagaState,
        reason: &str,
    ) -> Result<SagaInstance> {
        match self
            .inventory
            .release(
                booking.id,
                booking.user_id,
                booking.show_id,
                booking.zone_id,
                booking.event_id,
                self.config.reservation_ttl_secs + 60,
            )
            .await
        {
            Ok(_) | Err(AppError::AlreadyReleased) | Err(AppError::ReservationNotFound(_)) => {}
            Err(err) => return Err(err),
        }
        reservations::mark_status(&self.pool, booking.id, ReservationStatus::Released).await.ok();

        if saga.state == SagaState::Paid {
            if let Some(payment_id) = &saga.payment_id {
                self.events
                    .publish(DomainEvent::RefundRequested {
                        booking_id: booking.id,
                        saga_id: saga.id,
                        payment_id: payment_id.clone(),
                        at: Utc::now(),
                    })
                    .await;
            }
        }

        let updated = sagas::transition(
            &self.pool,
            saga.id,
            saga.version,
            to_state,
            None,
            None,
            None,
            Some(reason),
            reason,
            None,
        )
        .await?;
        bookings::mark_status(&self.pool, booking.id, to_state.booking_status(), None).await?;

        self.events
            .publish(DomainEvent::BookingFailed {
                booking_id: booking.id,
                saga_id: saga.id,
                user_id: booking.user_id,
                reason: reason.to_string(),
                at: Utc::now(),
            })
            .await;

        Ok(updated)
    }

    /// Reservation sweeper hook (spec.md §4.6, step 1): drives a single
    /// expired, still-`RESERVED` booking to `FAILED(EXPIRED)`.
    pub async fn expire_reservation(&self, booking_id: Uuid) -> Result<()> {
        let Some(saga) = sagas::find_by_booking_id(&self.pool, booking_id).await? else {
            return Ok(());
        };
        if saga.state != SagaState::Reserved {
            return Ok(());
        }
        let booking = bookings::find_by_id(&self.pool, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {booking_id} not found")))?;
        self.compensate_and_fail(&saga, &booking, SagaState::Failed, "EXPIRED").await?;
        Ok(())
    }

    /// Stalled-saga recovery (spec.md §4.4 "Recovery"; §9 "Stalled-saga
    /// recovery"). Scans sagas idle past `saga_stall_timeout_secs` and
    /// re-drives the step each is parked on. A small random delay before
    /// each re-drive avoids a recovery herd after a store outage.
    pub async fn recover_stalled_sagas(&self) -> Result<usize> {
        let stall_before = Utc::now() - chrono::Duration::seconds(self.config.saga_stall_timeout_secs);
        let stale = sagas::find_stale(&self.pool, stall_before).await?;
        let mut recovered = 0usize;

        for saga in stale {
            let jitter_ms = rand::thread_rng().gen_range(0..500u64);
            tokio::time::sleep(std::time::Duration::from_millis(jitter_ms)).await;

            let outcome = match saga.state {
                SagaState::Created => self.recover_created(&saga).await,
                SagaState::Reserved => self.recover_reserved(&saga).await,
                SagaState::Paid => self.confirm_step(&saga).await.map(|_| ()),
                SagaState::Confirmed | SagaState::Failed | SagaState::Cancelled => Ok(()),
            };

            match outcome {
                Ok(()) => recovered += 1,
                Err(err) if err.is_contention() => recovered += 1,
                Err(err) => {
                    tracing::warn!(saga_id = %saga.id, error = %err, "stalled saga recovery failed");
                }
            }
        }

        Ok(recovered)
    }

    async fn recover_created(&self, saga: &SagaInstance) -> Result<()> {
        let booking = bookings::find_by_id(&self.pool, saga.booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", saga.booking_id)))?;
        let show = show_zones::find_show(&self.pool, booking.show_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("show {} not found", booking.show_id)))?;
        let event = show_zones::find_event(&self.pool, booking.event_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("event {} not found", booking.event_id)))?;

        self.reserve_step(saga, &booking, &show, event.max_per_user).await?;
        Ok(())
    }

    async fn recover_reserved(&self, saga: &SagaInstance) -> Result<()> {
        let timeout = chrono::Duration::seconds(self.config.payment_timeout_secs);
        if Utc::now() - saga.updated_at < timeout {
            // Still within the payment window; nothing to do until the
            // webhook arrives or the timeout actually elapses.
            return Ok(());
        }

        let booking = bookings::find_by_id(&self.pool, saga.booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("booking {} not found", saga.booking_id)))?;

        // A webhook may simply have been dropped rather than never sent, but
        // `PaymentGateway::get_transaction` doesn't expose a settlement
        // status to reconcile against (spec.md §4.5's capability set is
        // `{CreateIntent, ConfirmIntent, Refund, GetTransaction}` with no
        // status query) — so recovery times the saga out the same way a
        // genuine gateway failure would.
        self.compensate_and_fail(saga, &booking, SagaState::Failed, "PAYMENT_TIMEOUT").await?;
        Ok(())
    }
}

fn to_booking_response(booking: &Booking) -> BookingResponse {
    BookingResponse {
        id: booking.id,
        tenant_id: booking.tenant_id,
        user_id: booking.user_id,
        event_id: booking.event_id,
        show_id: booking.show_id,
        zone_id: booking.zone_id,
        quantity: booking.quantity,
        unit_price: booking.unit_price,
        total_price: booking.total_price,
        currency: booking.currency.clone(),
        status: booking.status,
        confirmation_code: booking.confirmation_code.clone(),
        idempotency_key: booking.idempotency_key.clone(),
        created_at: booking.created_at,
        updated_at: booking.updated_at,
    }
}
