use actix_web::{HttpResponse, Result, web};
use serde::Deserialize;

use auth_services::middleware::AuthenticatedUser;
use rental_services::RentalError;

use crate::cart_service::CartService;

/// Request structure for adding a car to the cart.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    /// ID of the car to save.
    pub car_id: uuid::Uuid,
}

/// Adds a car to the authenticated user's cart.
pub async fn add_to_cart(
    pool: web::Data<sqlx::PgPool>,
    user: AuthenticatedUser,
    request: web::Json<AddToCartRequest>,
) -> Result<HttpResponse, RentalError> {
    let cart_service = CartService::new(pool.get_ref().clone());
    let item = cart_service.add_item(&user.id, &request.car_id).await?;

    Ok(HttpResponse::Created().json(item))
}

/// Gets the authenticated user's cart entries with car details.
pub async fn get_cart(
    pool: web::Data<sqlx::PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, RentalError> {
    let cart_service = CartService::new(pool.get_ref().clone());
    let items = cart_service.list_items(&user.id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "cart_items": items })))
}
