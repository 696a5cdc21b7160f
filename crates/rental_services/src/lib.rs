//! # Rental Services
//!
//! This crate implements the rental booking and availability engine: the car
//! registry, the rental ledger with its no-overlap invariant, and the booking
//! orchestrator that validates a request, prices it, and persists the rental
//! together with the availability flip in one transaction.

/// Types for cars, rentals, and booking requests.
mod types;
pub use types::*;

/// Pure pricing and date-range arithmetic.
pub mod pricing;

/// Service for car registry operations.
mod car_service;
pub use car_service::*;

/// Service for the rental ledger and booking orchestration.
mod rental_service;
pub use rental_service::*;
