pub mod booking;
pub mod idempotency_record;
pub mod payment_callback;
pub mod reservation;
pub mod saga_instance;
pub mod saga_transition;
pub mod show_zone;

pub use booking::Booking;
pub use idempotency_record::IdempotencyRecord;
pub use payment_callback::PaymentCallback;
pub use reservation::Reservation;
pub use saga_instance::SagaInstance;
pub use saga_transition::SagaTransition;
pub use show_zone::{Event, Show, Zone};
