pub mod saga;

pub use saga::codes::generate_confirmation_code;
pub use saga::events::{DomainEvent, EventSink, TracingEventSink};
pub use saga::orchestrator::SagaOrchestrator;
