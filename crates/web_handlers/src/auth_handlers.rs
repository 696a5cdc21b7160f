use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;
use validator::Validate;

use auth_services::jwt::JwtService;
use auth_services::service::AuthService;
use auth_services::types::*;

/// Handles user signup by validating the request, creating a new user
/// (client or agency, per the role tag), and returning a bearer token with
/// the user info. Returns a 201 Created response.
pub async fn signup(
    pool: web::Data<PgPool>,
    request: web::Json<SignUpRequest>,
) -> Result<HttpResponse, AuthError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let auth_service = AuthService::new(pool.get_ref().clone());
    let jwt_service = JwtService::new();

    // Create the user
    let user = auth_service.create_user(&request).await?;
    log::info!("New {} account: {}", user.role().as_str(), user.id);

    // Generate token
    let token = jwt_service.generate_access_token(&user)?;

    let response = AuthResponse {
        token,
        user: user.into(),
    };

    Ok(HttpResponse::Created().json(response))
}

/// Handles user login by validating the request, verifying credentials,
/// and returning a bearer token with the user info.
pub async fn login(
    pool: web::Data<PgPool>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    // Validate the request
    request
        .validate()
        .map_err(|e| AuthError::Validation(format!("Validation error: {}", e)))?;

    let auth_service = AuthService::new(pool.get_ref().clone());
    let jwt_service = JwtService::new();

    // Verify credentials
    let user = auth_service
        .verify_password(&request.email, &request.password)
        .await?;

    // Generate token
    let token = jwt_service.generate_access_token(&user)?;

    let response = AuthResponse {
        token,
        user: user.into(),
    };

    Ok(HttpResponse::Ok().json(response))
}
