pub mod queue_pass_sweeper;
pub mod queue_release;
pub mod reservation_sweeper;
pub mod saga_recovery;

pub use queue_pass_sweeper::sweep_expired_passes;
pub use queue_release::release_admitted_batches;
pub use reservation_sweeper::sweep_expired_reservations;
pub use saga_recovery::recover_stalled_sagas;
