use turnstile_core::SagaOrchestrator;

/// Stalled-saga recovery (spec.md §4.4 "Recovery"). Run once at worker
/// start and then on an interval, since a worker that starts mid-outage
/// needs the same sweep a long-running worker would eventually perform.
pub async fn recover_stalled_sagas(orchestrator: &SagaOrchestrator) -> anyhow::Result<usize> {
    let recovered = orchestrator.recover_stalled_sagas().await?;
    Ok(recovered)
}
