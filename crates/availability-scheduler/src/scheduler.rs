use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::store::{AvailabilityStore, StoreError};

/// Configuration for the availability scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// How many times a failed reset write is retried (default: 1).
    pub reset_retries: u32,

    /// Delay between reset attempts (default: 30 seconds).
    pub retry_delay: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reset_retries: 1,
            retry_delay: Duration::from_secs(30),
        }
    }
}

/// Outcome of a reconciliation pass.
#[derive(Debug, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Cars released immediately because no rental covers now.
    pub released: usize,
    /// Resets re-armed for rentals still in progress.
    pub rearmed: usize,
}

/// Schedules one-shot availability resets.
///
/// Each armed reset is an independent task; arming twice for the same car is
/// harmless because the reset write is idempotent. There is no cancellation
/// hook — a reset armed for a rental that is later cancelled still fires,
/// and the reconciliation pass corrects any drift that causes.
pub struct AvailabilityScheduler {
    store: Arc<dyn AvailabilityStore>,
    config: SchedulerConfig,
}

impl AvailabilityScheduler {
    /// Creates a scheduler over the given store.
    pub fn new(store: Arc<dyn AvailabilityStore>, config: Option<SchedulerConfig>) -> Self {
        Self {
            store,
            config: config.unwrap_or_default(),
        }
    }

    /// Arms a one-shot reset that flips the car back to available once
    /// `end_date` is reached. An `end_date` already in the past fires
    /// before this call returns instead of being skipped.
    pub async fn arm(&self, car_id: Uuid, end_date: DateTime<Utc>) {
        let delay = (end_date - Utc::now()).to_std().unwrap_or(Duration::ZERO);

        if delay.is_zero() {
            // One attempt inline so an already-elapsed period takes effect
            // before this call returns. The retry cycle moves to a task:
            // callers must never sit out the retry delay.
            match self.store.set_available(car_id, true).await {
                Ok(true) => info!("Car {} is now available again", car_id),
                Ok(false) => debug!("Car {} was already available", car_id),
                Err(e) if self.config.reset_retries > 0 => {
                    warn!(
                        "Availability reset for car {} failed (attempt 1): {}, retrying",
                        car_id, e
                    );
                    let store = self.store.clone();
                    let config = self.config.clone();
                    tokio::spawn(async move {
                        sleep(config.retry_delay).await;
                        fire(store, config, car_id, 1).await;
                    });
                }
                Err(e) => {
                    error!("Giving up on availability reset for car {}: {}", car_id, e);
                }
            }
            return;
        }

        info!(
            "Armed availability reset for car {} at {} (in {:?})",
            car_id, end_date, delay
        );

        let store = self.store.clone();
        let config = self.config.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            fire(store, config, car_id, 0).await;
        });
    }

    /// Corrects availability state after a restart and drift in general:
    /// releases cars left unavailable with no rental covering now, and
    /// re-arms a reset for every rental still in progress.
    pub async fn reconcile(&self) -> Result<ReconcileReport, StoreError> {
        let now = Utc::now();

        let stranded = self.store.stranded_cars(now).await?;
        let released = stranded.len();
        for car_id in stranded {
            fire(self.store.clone(), self.config.clone(), car_id, 0).await;
        }

        let active = self.store.active_rentals(now).await?;
        let rearmed = active.len();
        for (car_id, end_date) in active {
            self.arm(car_id, end_date).await;
        }

        let report = ReconcileReport { released, rearmed };
        info!(
            "Availability reconciliation: released {}, re-armed {}",
            report.released, report.rearmed
        );
        Ok(report)
    }
}

/// Performs the reset write, retrying per the configuration before logging
/// the failure and giving up. `failed` counts attempts that already failed
/// before this call.
async fn fire(
    store: Arc<dyn AvailabilityStore>,
    config: SchedulerConfig,
    car_id: Uuid,
    mut failed: u32,
) {
    loop {
        match store.set_available(car_id, true).await {
            Ok(true) => {
                info!("Car {} is now available again", car_id);
                return;
            }
            Ok(false) => {
                debug!("Car {} was already available", car_id);
                return;
            }
            Err(e) if failed < config.reset_retries => {
                failed += 1;
                warn!(
                    "Availability reset for car {} failed (attempt {}): {}, retrying",
                    car_id, failed, e
                );
                sleep(config.retry_delay).await;
            }
            Err(e) => {
                error!("Giving up on availability reset for car {}: {}", car_id, e);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// In-memory store double: a map of availability flags, a fixed rental
    /// list, and an optional number of writes to fail first.
    struct MemoryStore {
        cars: Mutex<HashMap<Uuid, bool>>,
        rentals: Mutex<Vec<(Uuid, DateTime<Utc>, DateTime<Utc>)>>,
        failing_writes: AtomicU32,
    }

    impl MemoryStore {
        fn new() -> Self {
            Self {
                cars: Mutex::new(HashMap::new()),
                rentals: Mutex::new(Vec::new()),
                failing_writes: AtomicU32::new(0),
            }
        }

        fn insert_car(&self, available: bool) -> Uuid {
            let id = Uuid::new_v4();
            self.cars.lock().unwrap().insert(id, available);
            id
        }

        fn insert_rental(&self, car_id: Uuid, start: DateTime<Utc>, end: DateTime<Utc>) {
            self.rentals.lock().unwrap().push((car_id, start, end));
        }

        fn is_available(&self, car_id: Uuid) -> bool {
            *self.cars.lock().unwrap().get(&car_id).unwrap()
        }
    }

    #[async_trait::async_trait]
    impl AvailabilityStore for MemoryStore {
        async fn set_available(&self, car_id: Uuid, available: bool) -> Result<bool, StoreError> {
            if self
                .failing_writes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Database(sqlx::Error::PoolClosed));
            }

            let mut cars = self.cars.lock().unwrap();
            let flag = cars.entry(car_id).or_insert(!available);
            let changed = *flag != available;
            *flag = available;
            Ok(changed)
        }

        async fn active_rentals(
            &self,
            now: DateTime<Utc>,
        ) -> Result<Vec<(Uuid, DateTime<Utc>)>, StoreError> {
            Ok(self
                .rentals
                .lock()
                .unwrap()
                .iter()
                .filter(|(_, _, end)| *end > now)
                .map(|(car, _, end)| (*car, *end))
                .collect())
        }

        async fn stranded_cars(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
            let rentals = self.rentals.lock().unwrap();
            Ok(self
                .cars
                .lock()
                .unwrap()
                .iter()
                .filter(|(car, available)| {
                    !**available
                        && !rentals
                            .iter()
                            .any(|(c, start, end)| c == *car && *start <= now && *end > now)
                })
                .map(|(car, _)| *car)
                .collect())
        }
    }

    fn fast_config() -> SchedulerConfig {
        SchedulerConfig {
            reset_retries: 1,
            retry_delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn past_end_date_fires_before_arm_returns() {
        let store = Arc::new(MemoryStore::new());
        let car = store.insert_car(false);
        let scheduler = AvailabilityScheduler::new(store.clone(), Some(fast_config()));

        scheduler
            .arm(car, Utc::now() - chrono::Duration::hours(1))
            .await;

        assert!(store.is_available(car));
    }

    #[tokio::test]
    async fn future_end_date_fires_after_the_delay() {
        let store = Arc::new(MemoryStore::new());
        let car = store.insert_car(false);
        let scheduler = AvailabilityScheduler::new(store.clone(), Some(fast_config()));

        scheduler
            .arm(car, Utc::now() + chrono::Duration::milliseconds(100))
            .await;
        assert!(!store.is_available(car), "reset must not fire early");

        sleep(Duration::from_millis(500)).await;
        assert!(store.is_available(car));
    }

    #[tokio::test]
    async fn failed_reset_write_is_retried_without_holding_the_caller() {
        let store = Arc::new(MemoryStore::new());
        let car = store.insert_car(false);
        store.failing_writes.store(1, Ordering::SeqCst);
        let config = SchedulerConfig {
            reset_retries: 1,
            retry_delay: Duration::from_millis(100),
        };
        let scheduler = AvailabilityScheduler::new(store.clone(), Some(config));

        scheduler
            .arm(car, Utc::now() - chrono::Duration::seconds(1))
            .await;

        // arm returned after the failed attempt; the retry is still pending
        assert!(!store.is_available(car));

        sleep(Duration::from_millis(500)).await;
        assert!(store.is_available(car));
    }

    #[tokio::test]
    async fn reset_exhausting_its_retries_gives_up() {
        let store = Arc::new(MemoryStore::new());
        let car = store.insert_car(false);
        store.failing_writes.store(5, Ordering::SeqCst);
        let scheduler = AvailabilityScheduler::new(store.clone(), Some(fast_config()));

        scheduler
            .arm(car, Utc::now() - chrono::Duration::seconds(1))
            .await;
        sleep(Duration::from_millis(200)).await;

        assert!(!store.is_available(car));
    }

    #[tokio::test]
    async fn arming_twice_for_the_same_car_is_harmless() {
        let store = Arc::new(MemoryStore::new());
        let car = store.insert_car(false);
        let scheduler = AvailabilityScheduler::new(store.clone(), Some(fast_config()));

        let past = Utc::now() - chrono::Duration::seconds(1);
        scheduler.arm(car, past).await;
        scheduler.arm(car, past).await;

        assert!(store.is_available(car));
    }

    #[tokio::test]
    async fn reconcile_releases_stranded_cars_and_rearms_active_rentals() {
        let store = Arc::new(MemoryStore::new());
        let now = Utc::now();

        // Rental ended an hour ago but the reset was lost
        let stranded = store.insert_car(false);
        store.insert_rental(
            stranded,
            now - chrono::Duration::hours(25),
            now - chrono::Duration::hours(1),
        );

        // Rental still in progress, ending shortly
        let in_progress = store.insert_car(false);
        store.insert_rental(
            in_progress,
            now - chrono::Duration::hours(1),
            now + chrono::Duration::milliseconds(100),
        );

        let scheduler = AvailabilityScheduler::new(store.clone(), Some(fast_config()));
        let report = scheduler.reconcile().await.unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                released: 1,
                rearmed: 1
            }
        );
        assert!(store.is_available(stranded));
        assert!(!store.is_available(in_progress));

        sleep(Duration::from_millis(500)).await;
        assert!(store.is_available(in_progress));
    }
}
