//! # Web Handlers for the Rental Marketplace
//!
//! This crate provides the web handlers for the rental marketplace backend.

/// Authentication handlers (signup, login)
mod auth_handlers;
pub use auth_handlers::*;

/// User profile handlers (get/update profile)
mod profile_handlers;
pub use profile_handlers::*;

/// Agency listing handlers for the map view
mod agency_handlers;
pub use agency_handlers::*;

/// Car registry handlers (listings and agency CRUD)
mod car_handlers;
pub use car_handlers::*;

/// Rental booking and history handlers
mod rental_handlers;
pub use rental_handlers::*;

/// Shopping cart service
mod cart_service;
pub use cart_service::*;

/// Shopping cart handlers
mod cart_handlers;
pub use cart_handlers::*;
