use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::types::{Car, CreateCarRequest, RentalError, Transmission, UpdateCarRequest};

const CAR_COLUMNS: &str = "id, agency_id, model, price_per_day, availability, \
     image, license_plate, transmission, created_at";

/// Service for car registry operations.
///
/// The registry is the single source of truth for a car's current
/// availability flag; only the booking orchestrator and the availability
/// scheduler write to it.
pub struct CarService {
    pool: PgPool,
}

impl CarService {
    /// Creates a new instance of `CarService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists a new car for the given agency.
    pub async fn create_car(
        &self,
        agency_id: &Uuid,
        request: &CreateCarRequest,
    ) -> Result<Car, RentalError> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO cars (agency_id, model, price_per_day, image, license_plate, transmission)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CAR_COLUMNS}
            "#
        ))
        .bind(agency_id)
        .bind(request.model.trim())
        .bind(request.price_per_day)
        .bind(&request.image)
        .bind(request.license_plate.trim())
        .bind(request.transmission.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if unique_violation(&e) {
                RentalError::Validation("License plate is already registered".to_string())
            } else {
                RentalError::Database(e)
            }
        })?;

        map_car(&row)
    }

    /// Gets a car by ID.
    pub async fn get_car(&self, car_id: &Uuid) -> Result<Car, RentalError> {
        let row = sqlx::query(&format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1"))
            .bind(car_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RentalError::CarNotFound)?;

        map_car(&row)
    }

    /// Lists every car in the marketplace, newest first.
    pub async fn list_cars(&self) -> Result<Vec<Car>, RentalError> {
        let rows = sqlx::query(&format!(
            "SELECT {CAR_COLUMNS} FROM cars ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_car).collect()
    }

    /// Lists the cars owned by a specific agency, newest first.
    pub async fn list_by_agency(&self, agency_id: &Uuid) -> Result<Vec<Car>, RentalError> {
        let rows = sqlx::query(&format!(
            "SELECT {CAR_COLUMNS} FROM cars WHERE agency_id = $1 ORDER BY created_at DESC"
        ))
        .bind(agency_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_car).collect()
    }

    /// Partially updates a car listing, ensuring it belongs to the agency.
    ///
    /// The license plate is immutable and the availability flag is owned by
    /// the booking flow, so neither can be updated here.
    pub async fn update_car(
        &self,
        agency_id: &Uuid,
        car_id: &Uuid,
        request: &UpdateCarRequest,
    ) -> Result<Car, RentalError> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE cars
            SET model = COALESCE($1, model),
                price_per_day = COALESCE($2, price_per_day),
                transmission = COALESCE($3, transmission),
                image = COALESCE($4, image)
            WHERE id = $5 AND agency_id = $6
            RETURNING {CAR_COLUMNS}
            "#
        ))
        .bind(request.model.as_deref().map(str::trim))
        .bind(request.price_per_day)
        .bind(request.transmission.map(|t| t.as_str()))
        .bind(&request.image)
        .bind(car_id)
        .bind(agency_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RentalError::CarNotFound)?;

        map_car(&row)
    }

    /// Deletes a car listing, ensuring it belongs to the agency.
    pub async fn delete_car(&self, agency_id: &Uuid, car_id: &Uuid) -> Result<(), RentalError> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1 AND agency_id = $2")
            .bind(car_id)
            .bind(agency_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RentalError::CarNotFound);
        }

        Ok(())
    }

    /// Sets the availability flag. Writing the current value is a no-op,
    /// not an error.
    pub async fn set_availability(
        &self,
        car_id: &Uuid,
        available: bool,
    ) -> Result<(), RentalError> {
        sqlx::query("UPDATE cars SET availability = $1 WHERE id = $2")
            .bind(available)
            .bind(car_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

/// Returns whether a sqlx error is a Postgres unique-constraint violation.
fn unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}

/// Maps a `cars` row onto the car model.
pub(crate) fn map_car(row: &PgRow) -> Result<Car, RentalError> {
    let transmission_text: String = row.get("transmission");
    let transmission = Transmission::parse(&transmission_text).ok_or_else(|| {
        RentalError::Validation(format!("Unknown transmission kind: {}", transmission_text))
    })?;

    Ok(Car {
        id: row.get("id"),
        agency_id: row.get("agency_id"),
        model: row.get("model"),
        price_per_day: row.get("price_per_day"),
        availability: row.get("availability"),
        image: row.get("image"),
        license_plate: row.get("license_plate"),
        transmission,
        created_at: row.get("created_at"),
    })
}
