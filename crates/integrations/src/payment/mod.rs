mod gateway;
mod mock_gateway;
mod stripe_gateway;

pub use gateway::{PaymentGateway, PaymentIntent, WebhookOutcome};
pub use mock_gateway::MockGateway;
pub use stripe_gateway::StripeGateway;
