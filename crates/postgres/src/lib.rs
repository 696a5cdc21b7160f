//! # Postgres
//!
//! This crate provides the database connection layer for the Rentili
//! car-rental marketplace. The schema lives in `schema.sql` next to this
//! crate and is applied with `psql $DATABASE_URL -f schema.sql`.

/// Database client for the rental marketplace.
pub mod database;
