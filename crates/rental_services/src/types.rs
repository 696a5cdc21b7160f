use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Transmission kind of a car.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    /// Manual gearbox.
    Manual,
    /// Automatic gearbox.
    Automatic,
}

impl Transmission {
    /// Returns the transmission as the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Transmission::Manual => "manual",
            Transmission::Automatic => "automatic",
        }
    }

    /// Parses a stored transmission string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "manual" => Some(Transmission::Manual),
            "automatic" => Some(Transmission::Automatic),
            _ => None,
        }
    }
}

/// Lifecycle status of a rental.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RentalStatus {
    /// Created at booking time, awaiting confirmation.
    Pending,
    /// Confirmed by the agency.
    Confirmed,
    /// The rental period has ended.
    Completed,
    /// Cancelled before completion.
    Cancelled,
}

impl RentalStatus {
    /// Returns the status as the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Confirmed => "confirmed",
            RentalStatus::Completed => "completed",
            RentalStatus::Cancelled => "cancelled",
        }
    }

    /// Parses a stored status string.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(RentalStatus::Pending),
            "confirmed" => Some(RentalStatus::Confirmed),
            "completed" => Some(RentalStatus::Completed),
            "cancelled" => Some(RentalStatus::Cancelled),
            _ => None,
        }
    }
}

/// Car model representing a row in the `cars` table.
#[derive(Debug, Clone, Serialize)]
pub struct Car {
    /// Unique identifier for the car.
    pub id: Uuid,
    /// ID of the owning agency.
    pub agency_id: Uuid,
    /// Model name shown in listings.
    pub model: String,
    /// Daily rental price.
    pub price_per_day: f64,
    /// Whether the car can currently be booked. Mutated only by the
    /// booking orchestrator and the availability scheduler.
    pub availability: bool,
    /// Optional image URL.
    pub image: Option<String>,
    /// Immutable unique license plate.
    pub license_plate: String,
    /// Transmission kind.
    pub transmission: Transmission,
    /// When the car was listed.
    pub created_at: DateTime<Utc>,
}

/// Rental model representing a row in the `rentals` table.
///
/// A rental owns its date range and its price snapshot; the price is not
/// recomputed if the car's daily rate later changes.
#[derive(Debug, Clone, Serialize)]
pub struct Rental {
    /// Unique identifier for the rental.
    pub id: Uuid,
    /// ID of the rented car.
    pub car_id: Uuid,
    /// ID of the booking client.
    pub client_id: Uuid,
    /// Start of the rental period (inclusive).
    pub start_date: DateTime<Utc>,
    /// End of the rental period (exclusive).
    pub end_date: DateTime<Utc>,
    /// Total price computed at booking time.
    pub total_price: f64,
    /// Lifecycle status.
    pub status: RentalStatus,
    /// Whether a driver was requested.
    pub with_driver: bool,
    /// Destination, when a driver was requested.
    pub destination: Option<String>,
    /// Payment status, driven by the out-of-scope payment flow.
    pub payment_status: String,
    /// Payment method, when paid.
    pub payment_method: Option<String>,
    /// Gateway transaction id, when paid.
    pub transaction_id: Option<String>,
    /// When the rental was created.
    pub created_at: DateTime<Utc>,
}

/// Request structure for listing a new car.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCarRequest {
    /// Model name shown in listings.
    #[validate(length(min = 1, message = "Model is required"))]
    pub model: String,

    /// Daily rental price.
    #[validate(range(min = 0.01, message = "Price per day must be positive"))]
    pub price_per_day: f64,

    /// License plate; must be unique across the marketplace.
    #[validate(length(min = 1, message = "License plate is required"))]
    pub license_plate: String,

    /// Transmission kind.
    pub transmission: Transmission,

    /// Optional image URL.
    #[serde(default)]
    pub image: Option<String>,
}

/// Request structure for partially updating a car listing.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCarRequest {
    /// New model name, if changing.
    #[validate(length(min = 1, message = "Model cannot be empty"))]
    pub model: Option<String>,

    /// New daily price, if changing.
    #[validate(range(min = 0.01, message = "Price per day must be positive"))]
    pub price_per_day: Option<f64>,

    /// New transmission kind, if changing.
    pub transmission: Option<Transmission>,

    /// New image URL, if changing.
    pub image: Option<String>,
}

/// Request structure for booking a rental.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateRentalRequest {
    /// ID of the car to rent.
    pub car_id: Uuid,

    /// First day of the rental.
    pub start_date: NaiveDate,

    /// Day the car is returned; must be after `start_date`.
    pub end_date: NaiveDate,

    /// Whether a driver is requested.
    #[serde(default)]
    pub with_driver: bool,

    /// Destination, meaningful when a driver is requested.
    #[serde(default)]
    pub destination: Option<String>,
}

/// Rental entry for a client's history view, joined with car and agency
/// display fields.
#[derive(Debug, Serialize)]
pub struct RentalWithCar {
    /// Unique identifier for the rental.
    pub id: Uuid,
    /// Start of the rental period.
    pub start_date: DateTime<Utc>,
    /// End of the rental period.
    pub end_date: DateTime<Utc>,
    /// Total price computed at booking time.
    pub total_price: f64,
    /// Lifecycle status.
    pub status: RentalStatus,
    /// ID of the rented car.
    pub car_id: Uuid,
    /// Model of the rented car.
    pub car_model: String,
    /// Current daily price of the car.
    pub price_per_day: f64,
    /// Image URL of the car.
    pub image: Option<String>,
    /// Name of the agency owning the car.
    pub agency_name: String,
}

/// Latest rental for a car, shown to the owning agency.
#[derive(Debug, Serialize)]
pub struct CarRentalSummary {
    /// Unique identifier for the rental.
    pub id: Uuid,
    /// Name of the booking client.
    pub client_name: String,
    /// Email of the booking client.
    pub client_email: String,
    /// Model of the rented car.
    pub car_model: String,
    /// Start of the rental period.
    pub start_date: DateTime<Utc>,
    /// End of the rental period.
    pub end_date: DateTime<Utc>,
}

/// Response structure for listing rentals.
#[derive(Debug, Serialize)]
pub struct ListRentalsResponse {
    /// Rentals ordered most recent first.
    pub rentals: Vec<RentalWithCar>,
    /// Total count of rentals.
    pub total: i64,
}

/// Custom error type for car and rental operations.
#[derive(Debug, thiserror::Error)]
pub enum RentalError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The referenced car does not exist.
    #[error("Car not found")]
    CarNotFound,

    /// No rental matches the query.
    #[error("Rental not found")]
    RentalNotFound,

    /// The caller's role does not permit the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The car is unavailable or already rented for the requested range.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl actix_web::ResponseError for RentalError {
    fn error_response(&self) -> actix_web::HttpResponse {
        use actix_web::HttpResponse;

        match self {
            RentalError::Validation(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "validation_error",
                "message": msg
            })),
            RentalError::CarNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "car_not_found",
                "message": "Car not found"
            })),
            RentalError::RentalNotFound => HttpResponse::NotFound().json(serde_json::json!({
                "error": "rental_not_found",
                "message": "No rental found for this car"
            })),
            RentalError::Forbidden(msg) => HttpResponse::Forbidden().json(serde_json::json!({
                "error": "forbidden",
                "message": msg
            })),
            // The booking contract reports range conflicts as 400s
            RentalError::Conflict(msg) => HttpResponse::BadRequest().json(serde_json::json!({
                "error": "car_unavailable",
                "message": msg
            })),
            RentalError::Database(_) => {
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "error": "internal_error",
                    "message": "An internal error occurred"
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transmission_round_trips_through_storage_form() {
        for kind in [Transmission::Manual, Transmission::Automatic] {
            assert_eq!(Transmission::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(Transmission::parse("sequential"), None);
    }

    #[test]
    fn create_car_request_rejects_non_positive_price() {
        let request = CreateCarRequest {
            model: "Clio 4".to_string(),
            price_per_day: 0.0,
            license_plate: "200 TU 4521".to_string(),
            transmission: Transmission::Manual,
            image: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn rental_request_dates_parse_from_iso_strings() {
        let json = serde_json::json!({
            "car_id": "7f1aa528-9c3e-4f6a-8d25-0a52019c90fd",
            "start_date": "2024-01-01",
            "end_date": "2024-01-04"
        });

        let request: CreateRentalRequest = serde_json::from_value(json).unwrap();
        assert!(!request.with_driver);
        assert_eq!(
            (request.end_date - request.start_date).num_days(),
            3,
            "three billable days"
        );
    }
}
