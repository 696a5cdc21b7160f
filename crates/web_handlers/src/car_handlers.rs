use actix_web::{HttpResponse, Result, web};
use validator::Validate;

use auth_services::middleware::AuthenticatedUser;
use auth_services::types::UserRole;
use rental_services::{CarService, CreateCarRequest, RentalError, UpdateCarRequest};

/// Lists a new car for the authenticated agency.
pub async fn create_car(
    pool: web::Data<sqlx::PgPool>,
    user: AuthenticatedUser,
    request: web::Json<CreateCarRequest>,
) -> Result<HttpResponse, RentalError> {
    if user.role != UserRole::Agency {
        return Err(RentalError::Forbidden(
            "Only agencies can add cars".to_string(),
        ));
    }

    // Validate the request
    request
        .validate()
        .map_err(|e| RentalError::Validation(format!("Validation error: {}", e)))?;

    let car_service = CarService::new(pool.get_ref().clone());
    let car = car_service.create_car(&user.id, &request).await?;

    Ok(HttpResponse::Created().json(car))
}

/// Lists every car in the marketplace.
pub async fn list_cars(pool: web::Data<sqlx::PgPool>) -> Result<HttpResponse, RentalError> {
    let car_service = CarService::new(pool.get_ref().clone());
    let cars = car_service.list_cars().await?;

    Ok(HttpResponse::Ok().json(cars))
}

/// Lists the cars owned by a specific agency.
pub async fn cars_by_agency(
    pool: web::Data<sqlx::PgPool>,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, RentalError> {
    let agency_id = path.into_inner();
    let car_service = CarService::new(pool.get_ref().clone());
    let cars = car_service.list_by_agency(&agency_id).await?;

    Ok(HttpResponse::Ok().json(cars))
}

/// Gets a specific car by ID.
pub async fn get_car(
    pool: web::Data<sqlx::PgPool>,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, RentalError> {
    let car_id = path.into_inner();
    let car_service = CarService::new(pool.get_ref().clone());
    let car = car_service.get_car(&car_id).await?;

    Ok(HttpResponse::Ok().json(car))
}

/// Partially updates a car listing owned by the authenticated agency.
pub async fn update_car(
    pool: web::Data<sqlx::PgPool>,
    user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
    request: web::Json<UpdateCarRequest>,
) -> Result<HttpResponse, RentalError> {
    if user.role != UserRole::Agency {
        return Err(RentalError::Forbidden(
            "Only agencies can update cars".to_string(),
        ));
    }

    // Validate the request
    request
        .validate()
        .map_err(|e| RentalError::Validation(format!("Validation error: {}", e)))?;

    let car_id = path.into_inner();
    let car_service = CarService::new(pool.get_ref().clone());
    let car = car_service.update_car(&user.id, &car_id, &request).await?;

    Ok(HttpResponse::Ok().json(car))
}

/// Deletes a car listing owned by the authenticated agency.
pub async fn delete_car(
    pool: web::Data<sqlx::PgPool>,
    user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, RentalError> {
    if user.role != UserRole::Agency {
        return Err(RentalError::Forbidden(
            "Only agencies can delete cars".to_string(),
        ));
    }

    let car_id = path.into_inner();
    let car_service = CarService::new(pool.get_ref().clone());
    car_service.delete_car(&user.id, &car_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Car deleted successfully"
    })))
}
