mod middleware;
mod response;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::error_handling::HandleErrorLayer;
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::{BoxError, Router};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use response::ApiError;
use turnstile_types::AppError;

use turnstile_core::{SagaOrchestrator, TracingEventSink};
use turnstile_integrations::identity::{HmacIdentityVerifier, IdentityVerifier};
use turnstile_integrations::payment::{MockGateway, PaymentGateway, StripeGateway};
use turnstile_inventory::InventoryStore;
use turnstile_queue::QueueStore;
use turnstile_types::Config;

use middleware::{rate_limit, RateLimiter};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnstile_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting turnstile booking API");

    let config = Config::from_env()?;

    let pool = turnstile_db::create_pool(&config.database_url).await?;
    tracing::info!("database connection established");

    let inventory = InventoryStore::connect(&config.redis_url).await?;
    let queue = QueueStore::connect(&config.redis_url).await?;
    let rate_limiter = RateLimiter::connect(&config.redis_url).await?;
    tracing::info!("redis connections established");

    let payments: Arc<dyn PaymentGateway> = if config.stripe_secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY not set, using mock payment gateway");
        Arc::new(MockGateway::new())
    } else {
        Arc::new(StripeGateway::new(&config.stripe_secret_key, &config.stripe_webhook_secret))
    };

    let identity: Arc<dyn IdentityVerifier> = Arc::new(HmacIdentityVerifier::new(&config.jwt_secret));

    let orchestrator = Arc::new(SagaOrchestrator::new(
        pool.clone(),
        inventory,
        queue.clone(),
        payments,
        Arc::new(TracingEventSink),
        config.clone(),
    ));

    let bind_addr = config.bind_addr.clone();
    let booking_concurrency_limit = config.booking_concurrency_limit;

    let state = AppState {
        db: pool,
        queue,
        orchestrator,
        identity,
        rate_limiter,
        config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers(Any);

    // `POST /bookings` additionally sits behind a concurrency limiter that
    // sheds load with an immediate 429 rather than queuing (spec.md §4.7
    // "Concurrency limiter": "excess requests are rejected, not queued").
    let queue_routes = Router::new()
        .route("/join", post(routes::queue::join))
        .route("/leave", delete(routes::queue::leave))
        .route("/position/:event_id", get(routes::queue::position))
        .route("/position/:event_id/stream", get(routes::queue::position_stream))
        .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit));

    let app = Router::new()
        .route("/health", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route(
            "/bookings",
            post(routes::bookings::create_booking).layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(handle_overload))
                    .layer(tower::load_shed::LoadShedLayer::new())
                    .layer(tower::limit::ConcurrencyLimitLayer::new(booking_concurrency_limit))
                    .layer(axum::middleware::from_fn_with_state(state.clone(), rate_limit)),
            ),
        )
        .route("/bookings", get(routes::bookings::list_my_bookings))
        .route("/bookings/:id", get(routes::bookings::get_booking))
        .nest("/queue", queue_routes)
        .route("/payments/webhook", post(routes::payments::webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = bind_addr.parse()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// `POST /bookings`'s concurrency limiter sheds excess requests with this
/// handler (spec.md §4.7: "excess requests are rejected, not queued")
/// instead of letting them wait behind the `ConcurrencyLimitLayer`.
async fn handle_overload(err: BoxError) -> ApiError {
    if err.is::<tower::load_shed::error::Overloaded>() {
        ApiError(AppError::TooManyRequests)
    } else {
        ApiError(AppError::Internal(err.to_string()))
    }
}
