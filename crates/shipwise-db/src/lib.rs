//! Shipwise Database Layer
//!
//! This crate provides storage for the Shipwise rate engine. It includes:
//!
//! - Connection pool management and migrations with sqlx
//! - PostgreSQL repositories for rate cards, courier services, seller
//!   policies and rate card history
//! - Legacy scheme detection when rate card rows are loaded
//! - In-memory repositories with the same contracts, for tests and local runs

pub mod in_memory;
pub mod pool;
pub mod repositories;

pub use in_memory::{
    InMemoryAuditSink, InMemoryCourierServiceRepository, InMemoryRateCardRepository,
    InMemorySellerPolicyRepository,
};
pub use pool::{create_pool, run_migrations};
pub use repositories::*;

// Re-export commonly used types
pub use shipwise_core::{AppError, AppResult};
pub use sqlx::PgPool;
