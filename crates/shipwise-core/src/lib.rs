//! Shipwise Core Library
//!
//! This crate provides the foundational types, traits, and error handling
//! for the Shipwise rate computation and courier selection engine. It
//! includes:
//!
//! - Domain models (RateCard, CourierService, SellerCourierPolicy, Quote)
//! - Repository and audit sink traits
//! - Unified error handling with HTTP response mapping
//! - Money rounding helpers
//! - Application configuration

pub mod config;
pub mod error;
pub mod models;
pub mod money;
pub mod traits;

pub use config::AppConfig;
pub use error::AppError;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
