use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use rental_services::RentalError;

/// A saved cart entry.
#[derive(Debug, Serialize)]
pub struct CartItem {
    /// Unique identifier for the cart entry.
    pub id: Uuid,
    /// ID of the owning user.
    pub user_id: Uuid,
    /// ID of the saved car.
    pub car_id: Uuid,
    /// When the entry was added.
    pub created_at: DateTime<Utc>,
}

/// Cart entry joined with car display fields.
#[derive(Debug, Serialize)]
pub struct CartItemWithCar {
    /// Unique identifier for the cart entry.
    pub id: Uuid,
    /// ID of the saved car.
    pub car_id: Uuid,
    /// Model of the saved car.
    pub car_model: String,
    /// Current daily price of the car.
    pub price_per_day: f64,
    /// Whether the car can currently be booked.
    pub availability: bool,
    /// Image URL of the car.
    pub image: Option<String>,
    /// When the entry was added.
    pub created_at: DateTime<Utc>,
}

/// Service for shopping-cart persistence.
pub struct CartService {
    pool: PgPool,
}

impl CartService {
    /// Creates a new instance of `CartService` with the provided database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Adds a car to the user's cart. Each car can be saved at most once.
    pub async fn add_item(&self, user_id: &Uuid, car_id: &Uuid) -> Result<CartItem, RentalError> {
        let car = sqlx::query("SELECT id FROM cars WHERE id = $1")
            .bind(car_id)
            .fetch_optional(&self.pool)
            .await?;

        if car.is_none() {
            return Err(RentalError::CarNotFound);
        }

        let row = sqlx::query(
            r#"
            INSERT INTO cart_items (user_id, car_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, car_id) DO NOTHING
            RETURNING id, user_id, car_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(car_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| {
            RentalError::Validation("This car is already in the cart".to_string())
        })?;

        Ok(CartItem {
            id: row.get("id"),
            user_id: row.get("user_id"),
            car_id: row.get("car_id"),
            created_at: row.get("created_at"),
        })
    }

    /// Gets the user's cart entries with car details, newest first.
    pub async fn list_items(&self, user_id: &Uuid) -> Result<Vec<CartItemWithCar>, RentalError> {
        let rows = sqlx::query(
            r#"
            SELECT
                ci.id, ci.created_at,
                c.id AS car_id, c.model AS car_model, c.price_per_day,
                c.availability, c.image
            FROM cart_items ci
            JOIN cars c ON ci.car_id = c.id
            WHERE ci.user_id = $1
            ORDER BY ci.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(|row| CartItemWithCar {
                id: row.get("id"),
                car_id: row.get("car_id"),
                car_model: row.get("car_model"),
                price_per_day: row.get("price_per_day"),
                availability: row.get("availability"),
                image: row.get("image"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(items)
    }
}
