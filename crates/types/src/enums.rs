use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Booking lifecycle status (spec.md §3 "Booking").
///
/// Mirrors the saga's state at all times — a booking's status is never
/// written directly, only as a side effect of a saga transition (§3
/// Invariants, #3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    #[default]
    Pending,
    Reserved,
    Paid,
    Confirmed,
    Expired,
    Cancelled,
    Failed,
}

impl FromStr for BookingStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "reserved" => Ok(Self::Reserved),
            "paid" => Ok(Self::Paid),
            "confirmed" => Ok(Self::Confirmed),
            "expired" => Ok(Self::Expired),
            "cancelled" => Ok(Self::Cancelled),
            "failed" => Ok(Self::Failed),
            _ => Err(()),
        }
    }
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Reserved => "reserved",
            Self::Paid => "paid",
            Self::Confirmed => "confirmed",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
        }
    }
}

/// Saga state (spec.md §4.4 transition diagram).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum SagaState {
    #[default]
    Created,
    Reserved,
    Paid,
    Confirmed,
    Failed,
    Cancelled,
}

impl FromStr for SagaState {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(Self::Created),
            "RESERVED" => Ok(Self::Reserved),
            "PAID" => Ok(Self::Paid),
            "CONFIRMED" => Ok(Self::Confirmed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            _ => Err(()),
        }
    }
}

impl SagaState {
    /// Terminal states accept no further transitions (§3 Invariants, #3).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed | Self::Cancelled)
    }

    /// Allowed next states, encoding the diagram in §4.4 exactly. Anything
    /// not listed here is rejected by `Saga::transition` rather than
    /// silently clamped (§9, "State-machine rejection of non-local state").
    pub fn allowed_transitions(&self) -> &'static [SagaState] {
        match self {
            Self::Created => &[Self::Reserved, Self::Failed, Self::Cancelled],
            Self::Reserved => &[Self::Paid, Self::Failed, Self::Cancelled],
            Self::Paid => &[Self::Confirmed, Self::Failed],
            Self::Confirmed | Self::Failed | Self::Cancelled => &[],
        }
    }

    pub fn can_transition_to(&self, next: SagaState) -> bool {
        self.allowed_transitions().contains(&next)
    }

    /// The booking status a saga state mirrors (§3: "booking.status mirrors
    /// saga-terminal outcome").
    pub fn booking_status(&self) -> BookingStatus {
        match self {
            Self::Created => BookingStatus::Pending,
            Self::Reserved => BookingStatus::Reserved,
            Self::Paid => BookingStatus::Paid,
            Self::Confirmed => BookingStatus::Confirmed,
            Self::Failed => BookingStatus::Failed,
            Self::Cancelled => BookingStatus::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_allow_nothing() {
        assert!(SagaState::Confirmed.allowed_transitions().is_empty());
        assert!(SagaState::Failed.allowed_transitions().is_empty());
        assert!(SagaState::Cancelled.allowed_transitions().is_empty());
        assert!(SagaState::Confirmed.is_terminal());
        assert!(!SagaState::Reserved.is_terminal());
    }

    #[test]
    fn transition_table_matches_diagram() {
        assert!(SagaState::Created.can_transition_to(SagaState::Reserved));
        assert!(SagaState::Created.can_transition_to(SagaState::Failed));
        assert!(SagaState::Created.can_transition_to(SagaState::Cancelled));
        assert!(!SagaState::Created.can_transition_to(SagaState::Paid));
        assert!(!SagaState::Created.can_transition_to(SagaState::Confirmed));

        assert!(SagaState::Reserved.can_transition_to(SagaState::Paid));
        assert!(!SagaState::Reserved.can_transition_to(SagaState::Confirmed));

        assert!(SagaState::Paid.can_transition_to(SagaState::Confirmed));
        assert!(SagaState::Paid.can_transition_to(SagaState::Failed));
        assert!(!SagaState::Paid.can_transition_to(SagaState::Cancelled));
    }

    #[test]
    fn no_transition_skips_a_terminal_state_backdoor() {
        // Every non-terminal state's allowed set must exclude states that
        // would widen the path beyond the diagram (spec.md §9).
        for state in [SagaState::Created, SagaState::Reserved, SagaState::Paid] {
            assert!(!state.can_transition_to(state), "{state:?} cannot self-loop");
        }
    }

    #[test]
    fn booking_status_mirrors_saga_state() {
        assert_eq!(SagaState::Created.booking_status(), BookingStatus::Pending);
        assert_eq!(SagaState::Paid.booking_status(), BookingStatus::Paid);
        assert_eq!(SagaState::Confirmed.booking_status(), BookingStatus::Confirmed);
    }

    #[test]
    fn from_str_round_trips() {
        assert_eq!("CREATED".parse::<SagaState>().unwrap(), SagaState::Created);
        assert_eq!("confirmed".parse::<BookingStatus>().unwrap(), BookingStatus::Confirmed);
        assert!("bogus".parse::<SagaState>().is_err());
    }
}

/// Reservation status (spec.md §3 "Reservation").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    #[default]
    Reserved,
    Released,
    Consumed,
}

impl FromStr for ReservationStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(Self::Reserved),
            "released" => Ok(Self::Released),
            "consumed" => Ok(Self::Consumed),
            _ => Err(()),
        }
    }
}

/// Payment gateway transaction status (§4.5), distinct from
/// [`BookingStatus`]/[`SagaState`] since a gateway transaction can sit in
/// states the saga never observes (e.g. `requires_action`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentIntentStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl FromStr for PaymentIntentStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            _ => Err(()),
        }
    }
}
