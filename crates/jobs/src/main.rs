mod jobs;

use std::sync::Arc;
use std::time::Duration;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use turnstile_core::{SagaOrchestrator, TracingEventSink};
use turnstile_integrations::payment::{MockGateway, PaymentGateway, StripeGateway};
use turnstile_inventory::InventoryStore;
use turnstile_queue::QueueStore;
use turnstile_types::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "turnstile_jobs=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("starting turnstile background jobs");

    let config = Config::from_env()?;

    let pool = turnstile_db::create_pool(&config.database_url).await?;
    tracing::info!("database connection established");

    let inventory = InventoryStore::connect(&config.redis_url).await?;
    let queue = QueueStore::connect(&config.redis_url).await?;
    tracing::info!("redis connections established");

    let payments: Arc<dyn PaymentGateway> = if config.stripe_secret_key.is_empty() {
        tracing::warn!("STRIPE_SECRET_KEY not set, using mock payment gateway");
        Arc::new(MockGateway::new())
    } else {
        Arc::new(StripeGateway::new(&config.stripe_secret_key, &config.stripe_webhook_secret))
    };

    let orchestrator = Arc::new(SagaOrchestrator::new(
        pool.clone(),
        inventory,
        queue.clone(),
        payments,
        Arc::new(TracingEventSink),
        config.clone(),
    ));

    // Worker-start recovery sweep (spec.md §4.4 "Recovery": "On worker
    // start, scan sagas whose state is not terminal...").
    match jobs::recover_stalled_sagas(&orchestrator).await {
        Ok(n) if n > 0 => tracing::info!(recovered = n, "recovered stalled sagas on startup"),
        Ok(_) => {}
        Err(err) => tracing::error!(error = %err, "startup saga recovery failed"),
    }

    let scheduler = JobScheduler::new().await?;

    let reservation_pool = pool.clone();
    let reservation_orchestrator = orchestrator.clone();
    let reservation_job = Job::new_repeated_async(Duration::from_secs(1), move |_uuid, _l| {
        let pool = reservation_pool.clone();
        let orchestrator = reservation_orchestrator.clone();
        Box::pin(async move {
            if let Err(err) = jobs::sweep_expired_reservations(&pool, &orchestrator).await {
                tracing::error!(error = %err, "reservation sweeper failed");
            }
        })
    })?;
    scheduler.add(reservation_job).await?;
    tracing::info!("registered job: reservation_sweeper (every 1s)");

    let pass_pool = pool.clone();
    let pass_queue = queue.clone();
    let pass_job = Job::new_repeated_async(Duration::from_secs(1), move |_uuid, _l| {
        let pool = pass_pool.clone();
        let queue = pass_queue.clone();
        Box::pin(async move {
            if let Err(err) = jobs::sweep_expired_passes(&pool, &queue).await {
                tracing::error!(error = %err, "queue pass sweeper failed");
            }
        })
    })?;
    scheduler.add(pass_job).await?;
    tracing::info!("registered job: queue_pass_sweeper (every 1s)");

    let release_pool = pool.clone();
    let release_queue = queue.clone();
    let release_pass_ttl_secs = config.queue_pass_ttl_secs;
    let release_job = Job::new_repeated_async(Duration::from_secs(1), move |_uuid, _l| {
        let pool = release_pool.clone();
        let queue = release_queue.clone();
        Box::pin(async move {
            if let Err(err) = jobs::release_admitted_batches(&pool, &queue, release_pass_ttl_secs).await {
                tracing::error!(error = %err, "queue release job failed");
            }
        })
    })?;
    scheduler.add(release_job).await?;
    tracing::info!("registered job: queue_release (every 1s)");

    let recovery_orchestrator = orchestrator.clone();
    let recovery_interval = Duration::from_secs(config.saga_stall_timeout_secs.max(5) as u64);
    let recovery_job = Job::new_repeated_async(recovery_interval, move |_uuid, _l| {
        let orchestrator = recovery_orchestrator.clone();
        Box::pin(async move {
            match jobs::recover_stalled_sagas(&orchestrator).await {
                Ok(n) if n > 0 => tracing::info!(recovered = n, "recovered stalled sagas"),
                Ok(_) => {}
                Err(err) => tracing::error!(error = %err, "saga recovery sweep failed"),
            }
        })
    })?;
    scheduler.add(recovery_job).await?;
    tracing::info!(interval_secs = recovery_interval.as_secs(), "registered job: saga_recovery");

    scheduler.start().await?;
    tracing::info!("job scheduler running");

    loop {
        tokio::time::sleep(Duration::from_secs(3600)).await;
    }
}
