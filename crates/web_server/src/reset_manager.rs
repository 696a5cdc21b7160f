use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use sqlx::PgPool;
use tokio::task::JoinHandle;

use availability_scheduler::{AvailabilityScheduler, PgAvailabilityStore, SchedulerConfig};

/// How often the background sweep re-runs reconciliation.
const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Manager for the availability reset system.
/// Integrates with the web server to keep car availability consistent with
/// the rental ledger across restarts.
pub struct ResetManager {
    pool: PgPool,
    sweep_handle: Option<JoinHandle<()>>,
    scheduler: Option<Arc<AvailabilityScheduler>>,
}

impl ResetManager {
    /// Create a new reset manager
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            sweep_handle: None,
            scheduler: None,
        }
    }

    /// Start the reset system: build the scheduler, run the startup
    /// reconciliation pass, and spawn the periodic sweep.
    pub async fn start(
        &mut self,
    ) -> Result<Arc<AvailabilityScheduler>, Box<dyn std::error::Error + Send + Sync>> {
        info!("Starting availability reset system");

        let store = Arc::new(PgAvailabilityStore::new(self.pool.clone()));
        let scheduler = Arc::new(AvailabilityScheduler::new(
            store,
            Some(SchedulerConfig::default()),
        ));

        // Correct any state left over from a previous run
        let report = scheduler.reconcile().await?;
        info!(
            "Startup reconciliation: released {} cars, re-armed {} resets",
            report.released, report.rearmed
        );

        // Periodic sweep for drift the one-shot tasks cannot cover
        let sweeper = scheduler.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
            // the first tick fires immediately; the startup pass already ran
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if let Err(e) = sweeper.reconcile().await {
                    error!("Availability sweep failed: {}", e);
                }
            }
        });

        self.sweep_handle = Some(handle);
        self.scheduler = Some(scheduler.clone());

        info!("Availability reset system started successfully");
        Ok(scheduler)
    }

    /// Stop the reset system
    pub async fn stop(&mut self) {
        info!("Stopping availability reset system");

        if let Some(handle) = self.sweep_handle.take() {
            handle.abort();
            let _ = handle.await;
        }

        self.scheduler = None;

        info!("Availability reset system stopped");
    }
}

impl Drop for ResetManager {
    fn drop(&mut self) {
        if let Some(handle) = self.sweep_handle.take() {
            handle.abort();
        }
    }
}
