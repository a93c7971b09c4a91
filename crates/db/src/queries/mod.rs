pub mod bookings;
pub mod idempotency;
pub mod payment_callbacks;
pub mod reservations;
pub mod sagas;
pub mod show_zones;
