//! # Auth Services
//!
//! This crate provides authentication services for the rental marketplace.
//! It includes JWT token handling, middleware for request authentication,
//! and the role-tagged user model shared by clients and agencies.

/// JWT token handling and user authentication services.
pub mod jwt;
/// Middleware for request authentication and the authenticated-user extractor.
pub mod middleware;
/// Service definitions for user management and authentication operations.
pub mod service;
/// Types and structures used in authentication services.
pub mod types;
