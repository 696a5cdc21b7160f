use actix_web::{HttpResponse, Result, web};
use sqlx::PgPool;

use auth_services::service::AuthService;
use auth_services::types::AuthError;

/// Lists every agency with the coordinates used by the map view.
pub async fn list_agencies(pool: web::Data<PgPool>) -> Result<HttpResponse, AuthError> {
    let auth_service = AuthService::new(pool.get_ref().clone());
    let agencies = auth_service.list_agencies().await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "agencies": agencies })))
}

/// Gets the public details of a single agency.
pub async fn get_agency(
    pool: web::Data<PgPool>,
    path: web::Path<uuid::Uuid>,
) -> Result<HttpResponse, AuthError> {
    let agency_id = path.into_inner();
    let auth_service = AuthService::new(pool.get_ref().clone());
    let agency = auth_service.get_agency(&agency_id).await?;

    Ok(HttpResponse::Ok().json(agency))
}
