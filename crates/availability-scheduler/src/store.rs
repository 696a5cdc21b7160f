use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// Error type for availability storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage operations the scheduler needs.
///
/// Kept behind a trait so reset and reconciliation logic can be exercised
/// against an in-memory double.
#[async_trait::async_trait]
pub trait AvailabilityStore: Send + Sync {
    /// Sets a car's availability flag. Returns whether the stored value
    /// changed; writing the current value is a no-op, not an error.
    async fn set_available(&self, car_id: Uuid, available: bool) -> Result<bool, StoreError>;

    /// Rentals whose period has not yet ended at `now`, as
    /// `(car_id, end_date)` pairs. Cancelled rentals are excluded.
    async fn active_rentals(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, DateTime<Utc>)>, StoreError>;

    /// Cars still flagged unavailable although no rental covers `now`.
    /// These are the cars whose reset was lost (e.g. to a restart).
    async fn stranded_cars(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError>;
}

/// Postgres-backed availability store.
pub struct PgAvailabilityStore {
    pool: PgPool,
}

impl PgAvailabilityStore {
    /// Creates a store over the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl AvailabilityStore for PgAvailabilityStore {
    async fn set_available(&self, car_id: Uuid, available: bool) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE cars SET availability = $1 WHERE id = $2 AND availability <> $1")
                .bind(available)
                .bind(car_id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn active_rentals(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<(Uuid, DateTime<Utc>)>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT car_id, end_date
            FROM rentals
            WHERE end_date > $1 AND status <> 'cancelled'
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.get("car_id"), row.get("end_date")))
            .collect())
    }

    async fn stranded_cars(&self, now: DateTime<Utc>) -> Result<Vec<Uuid>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id
            FROM cars c
            WHERE c.availability = FALSE
              AND NOT EXISTS (
                  SELECT 1 FROM rentals r
                  WHERE r.car_id = c.id
                    AND r.status <> 'cancelled'
                    AND r.start_date <= $1
                    AND r.end_date > $1
              )
            "#,
        )
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("id")).collect())
    }
}
