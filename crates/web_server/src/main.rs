//! Main entry point for the Rentili marketplace backend server.
//! This crate wires the REST API endpoints to the booking engine and the
//! availability reset system.

use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};
use auth_services::middleware::AuthMiddleware;
use postgres::database::*;
use web_handlers::*;

mod reset_manager;
use reset_manager::ResetManager;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    log::info!("Starting rental marketplace server...");

    // Create database connection pool
    let pool = match create_connection_pool().await {
        Ok(pool) => {
            log::info!("Database pool created successfully");

            if let Err(e) = test_connection(&pool).await {
                log::error!("Database connection test failed: {}", e);
            }
            pool
        }
        Err(e) => {
            log::error!("Failed to create database pool: {}", e);
            log::error!("Make sure PostgreSQL is running and DATABASE_URL is set");
            std::process::exit(1);
        }
    };

    // Start the availability reset system (startup reconciliation + sweep)
    let mut reset_manager = ResetManager::new(pool.clone());
    let scheduler = match reset_manager.start().await {
        Ok(scheduler) => scheduler,
        Err(e) => {
            log::error!("Failed to start availability reset system: {}", e);
            std::process::exit(1);
        }
    };
    let scheduler_data = web::Data::from(scheduler);

    let bind_addr =
        std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    log::info!("Server will be available at: http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(scheduler_data.clone())
            .wrap(Logger::default())
            // Public routes
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .route("/agencies", web::get().to(list_agencies))
            .route("/agencies/{agency_id}", web::get().to(get_agency))
            // Car registry: reads are public, writes verify the bearer
            // token through the AuthenticatedUser extractor
            .service(
                web::scope("/cars")
                    .route("", web::get().to(list_cars))
                    .route("", web::post().to(create_car))
                    .route("/agency/{agency_id}", web::get().to(cars_by_agency))
                    .route("/{car_id}", web::get().to(get_car))
                    .route("/{car_id}", web::put().to(update_car))
                    .route("/{car_id}", web::delete().to(delete_car)),
            )
            // Booking routes (require authentication)
            .service(
                web::scope("/rentals")
                    .wrap(AuthMiddleware)
                    .route("", web::post().to(create_rental))
                    .route("/user", web::get().to(user_rentals))
                    .route("/car/{car_id}", web::get().to(car_rental)),
            )
            // Cart routes (require authentication)
            .service(
                web::scope("/cart")
                    .wrap(AuthMiddleware)
                    .route("", web::post().to(add_to_cart))
                    .route("", web::get().to(get_cart)),
            )
            // Profile routes (require authentication)
            .service(
                web::scope("/user")
                    .wrap(AuthMiddleware)
                    .route("", web::get().to(get_profile))
                    .route("", web::put().to(update_profile)),
            )
            .route(
                "/health",
                web::get().to(|| async { HttpResponse::Ok().body("OK") }),
            )
    })
    .bind(bind_addr)?
    .run()
    .await
}
