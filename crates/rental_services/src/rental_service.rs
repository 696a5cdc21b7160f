use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::pricing;
use crate::types::{
    CarRentalSummary, CreateRentalRequest, Rental, RentalError, RentalStatus, RentalWithCar,
};

const RENTAL_COLUMNS: &str = "id, car_id, client_id, start_date, end_date, total_price, \
     status, with_driver, destination, payment_status, payment_method, transaction_id, \
     created_at";

/// Service for the rental ledger and booking orchestration.
///
/// The ledger is the single source of truth for overlap queries; the half-open
/// interval test `existing.start < new_end AND existing.end > new_start` is
/// the sole conflict-detection rule.
pub struct RentalService {
    pool: PgPool,
}

impl RentalService {
    /// Creates a new instance of `RentalService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns any non-cancelled rental for the car whose stored range
    /// intersects `[start, end)`. Touching endpoints do not intersect.
    ///
    /// Takes an executor rather than the pool so the booking flow can run
    /// the check inside its transaction, behind the `FOR UPDATE` car lock.
    /// The interval comparison itself is [`pricing::overlaps`].
    pub async fn find_overlapping<'e>(
        executor: impl sqlx::PgExecutor<'e>,
        car_id: &Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Option<Rental>, RentalError> {
        let rows = sqlx::query(&format!(
            "SELECT {RENTAL_COLUMNS} FROM rentals WHERE car_id = $1"
        ))
        .bind(car_id)
        .fetch_all(executor)
        .await?;

        let rentals = rows.iter().map(map_rental).collect::<Result<Vec<_>, _>>()?;
        Ok(first_conflict(rentals, start, end))
    }

    /// Books a car for a client.
    ///
    /// Validates the period, checks the availability flag (fast path) and
    /// the ledger (authoritative) for conflicts, prices the period, and
    /// persists the rental together with the availability flip.
    ///
    /// The conflict check and both writes run inside one transaction holding
    /// a `FOR UPDATE` lock on the car row, so two concurrent requests for
    /// the same car cannot both pass the check and double-book the range.
    pub async fn book(
        &self,
        client_id: &Uuid,
        request: &CreateRentalRequest,
    ) -> Result<Rental, RentalError> {
        let start = day_start(request.start_date);
        let end = day_start(request.end_date);

        if !pricing::valid_period(start, end) {
            return Err(RentalError::Validation(
                "End date must be after start date".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // Per-car mutual exclusion for the rest of the booking
        let car_row = sqlx::query(
            "SELECT id, price_per_day, availability FROM cars WHERE id = $1 FOR UPDATE",
        )
        .bind(request.car_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RentalError::CarNotFound)?;

        if !car_row.get::<bool, _>("availability") {
            return Err(RentalError::Conflict(
                "Car is currently unavailable".to_string(),
            ));
        }

        if Self::find_overlapping(&mut *tx, &request.car_id, start, end)
            .await?
            .is_some()
        {
            return Err(RentalError::Conflict(
                "Car is already rented for the selected dates".to_string(),
            ));
        }

        // Price snapshot at booking time
        let total_price = pricing::total_price(start, end, car_row.get("price_per_day"));

        let destination = if request.with_driver {
            request.destination.as_deref()
        } else {
            None
        };

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO rentals (car_id, client_id, start_date, end_date, total_price,
                                 with_driver, destination)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RENTAL_COLUMNS}
            "#
        ))
        .bind(request.car_id)
        .bind(client_id)
        .bind(start)
        .bind(end)
        .bind(total_price)
        .bind(request.with_driver)
        .bind(destination)
        .fetch_one(&mut *tx)
        .await?;

        // Same logical step as the insert; committed or rolled back together
        sqlx::query("UPDATE cars SET availability = FALSE WHERE id = $1 AND availability = TRUE")
            .bind(request.car_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let rental = map_rental(&row)?;
        log::info!(
            "Rental {} created for car {} ({} -> {}, total {})",
            rental.id,
            rental.car_id,
            request.start_date,
            request.end_date,
            rental.total_price
        );

        Ok(rental)
    }

    /// Gets all rentals for a client, most recent start date first.
    pub async fn list_by_client(&self, client_id: &Uuid) -> Result<Vec<RentalWithCar>, RentalError> {
        let rows = sqlx::query(
            r#"
            SELECT
                r.id, r.start_date, r.end_date, r.total_price, r.status,
                c.id AS car_id, c.model AS car_model, c.price_per_day, c.image,
                u.agency_name
            FROM rentals r
            JOIN cars c ON r.car_id = c.id
            JOIN users u ON c.agency_id = u.id
            WHERE r.client_id = $1
            ORDER BY r.start_date DESC
            "#,
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let status = parse_status(&row)?;
                Ok(RentalWithCar {
                    id: row.get("id"),
                    start_date: row.get("start_date"),
                    end_date: row.get("end_date"),
                    total_price: row.get("total_price"),
                    status,
                    car_id: row.get("car_id"),
                    car_model: row.get("car_model"),
                    price_per_day: row.get("price_per_day"),
                    image: row.get("image"),
                    agency_name: row
                        .get::<Option<String>, _>("agency_name")
                        .unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Gets the most recent rental for a car, with client display fields.
    /// Used by the owning agency's notification view.
    pub async fn latest_for_car(&self, car_id: &Uuid) -> Result<CarRentalSummary, RentalError> {
        let row = sqlx::query(
            r#"
            SELECT
                r.id, r.start_date, r.end_date,
                c.model AS car_model,
                COALESCE(u.first_name || ' ' || u.last_name, u.email) AS client_name,
                u.email AS client_email
            FROM rentals r
            JOIN cars c ON r.car_id = c.id
            JOIN users u ON r.client_id = u.id
            WHERE r.car_id = $1
            ORDER BY r.created_at DESC
            LIMIT 1
            "#,
        )
        .bind(car_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RentalError::RentalNotFound)?;

        Ok(CarRentalSummary {
            id: row.get("id"),
            client_name: row.get("client_name"),
            client_email: row.get("client_email"),
            car_model: row.get("car_model"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
        })
    }
}

/// First rental in the ledger slice whose range intersects `[start, end)`.
/// Cancelled rentals never conflict.
fn first_conflict(
    rentals: Vec<Rental>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Option<Rental> {
    rentals.into_iter().find(|rental| {
        rental.status != RentalStatus::Cancelled
            && pricing::overlaps(rental.start_date, rental.end_date, start, end)
    })
}

/// Midnight UTC at the start of the given calendar day.
fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

fn parse_status(row: &PgRow) -> Result<RentalStatus, RentalError> {
    let text: String = row.get("status");
    RentalStatus::parse(&text)
        .ok_or_else(|| RentalError::Validation(format!("Unknown rental status: {}", text)))
}

/// Maps a `rentals` row onto the rental model.
fn map_rental(row: &PgRow) -> Result<Rental, RentalError> {
    let status = parse_status(row)?;

    Ok(Rental {
        id: row.get("id"),
        car_id: row.get("car_id"),
        client_id: row.get("client_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        total_price: row.get("total_price"),
        status,
        with_driver: row.get("with_driver"),
        destination: row.get("destination"),
        payment_status: row.get("payment_status"),
        payment_method: row.get("payment_method"),
        transaction_id: row.get("transaction_id"),
        created_at: row.get("created_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn rental(start: DateTime<Utc>, end: DateTime<Utc>, status: RentalStatus) -> Rental {
        Rental {
            id: Uuid::new_v4(),
            car_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            start_date: start,
            end_date: end,
            total_price: 150.0,
            status,
            with_driver: false,
            destination: None,
            payment_status: "pending".to_string(),
            payment_method: None,
            transaction_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn booked_range_conflicts_with_itself() {
        // Re-checking a range that was just booked must report a conflict
        let (start, end) = (date(2024, 1, 1), date(2024, 1, 4));
        let ledger = vec![rental(start, end, RentalStatus::Pending)];

        assert!(first_conflict(ledger, start, end).is_some());
    }

    #[test]
    fn request_inside_a_booked_range_conflicts() {
        let ledger = vec![rental(date(2024, 1, 1), date(2024, 1, 4), RentalStatus::Confirmed)];

        assert!(first_conflict(ledger, date(2024, 1, 2), date(2024, 1, 3)).is_some());
    }

    #[test]
    fn back_to_back_request_does_not_conflict() {
        // Starting the day an existing rental ends is allowed
        let ledger = vec![rental(date(2024, 1, 1), date(2024, 1, 4), RentalStatus::Confirmed)];

        assert!(first_conflict(ledger, date(2024, 1, 4), date(2024, 1, 6)).is_none());
    }

    #[test]
    fn cancelled_rentals_do_not_block_the_range() {
        let ledger = vec![rental(date(2024, 1, 1), date(2024, 1, 4), RentalStatus::Cancelled)];

        assert!(first_conflict(ledger, date(2024, 1, 2), date(2024, 1, 5)).is_none());
    }

    #[test]
    fn conflict_reports_the_blocking_rental() {
        let blocking = rental(date(2024, 1, 3), date(2024, 1, 6), RentalStatus::Confirmed);
        let ledger = vec![
            rental(date(2024, 1, 1), date(2024, 1, 2), RentalStatus::Confirmed),
            blocking.clone(),
        ];

        let found = first_conflict(ledger, date(2024, 1, 5), date(2024, 1, 8)).unwrap();
        assert_eq!(found.id, blocking.id);
    }
}
