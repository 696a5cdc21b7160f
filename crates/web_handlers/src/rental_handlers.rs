use actix_web::{HttpResponse, Result, web};

use auth_services::middleware::AuthenticatedUser;
use auth_services::types::UserRole;
use availability_scheduler::AvailabilityScheduler;
use rental_services::{CreateRentalRequest, ListRentalsResponse, RentalError, RentalService};

/// Books a car for the authenticated client and arms the availability reset
/// for the end of the rental period.
pub async fn create_rental(
    pool: web::Data<sqlx::PgPool>,
    scheduler: web::Data<AvailabilityScheduler>,
    user: AuthenticatedUser,
    request: web::Json<CreateRentalRequest>,
) -> Result<HttpResponse, RentalError> {
    if user.role != UserRole::Client {
        return Err(RentalError::Forbidden(
            "Only clients can create rentals".to_string(),
        ));
    }

    let rental_service = RentalService::new(pool.get_ref().clone());
    let rental = rental_service.book(&user.id, &request).await?;

    // Armed only after the booking transaction committed
    scheduler.arm(rental.car_id, rental.end_date).await;

    Ok(HttpResponse::Created().json(rental))
}

/// Gets the authenticated user's rentals, most recent first.
pub async fn user_rentals(
    pool: web::Data<sqlx::PgPool>,
    user: AuthenticatedUser,
) -> Result<HttpResponse, RentalError> {
    let rental_service = RentalService::new(pool.get_ref().clone());
    let rentals = rental_service.list_by_client(&user.id).await?;

    let response = ListRentalsResponse {
        total: rentals.len() as i64,
        rentals,
    };

    Ok(HttpResponse::Ok().json(response))
}

/// Gets the most recent rental for a car, formatted for the owning agency's
/// notification view.
pub async fn car_rental(
    pool: web::Data<sqlx::PgPool>,
    _user: AuthenticatedUser,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, RentalError> {
    let car_id = path.into_inner();
    let rental_service = RentalService::new(pool.get_ref().clone());
    let rental = rental_service.latest_for_car(&car_id).await?;

    let message = format!(
        "{} rented the {} from {} to {}",
        rental.client_name,
        rental.car_model,
        rental.start_date.format("%Y-%m-%d"),
        rental.end_date.format("%Y-%m-%d")
    );

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": message,
        "rental": rental
    })))
}
