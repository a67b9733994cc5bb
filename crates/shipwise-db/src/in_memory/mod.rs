//! In-memory repositories
//!
//! Implementations of the core storage traits with the same contracts as
//! the PostgreSQL repositories, for tests and local runs without a database.
//!
//! All implementations use `Arc<RwLock<..>>` for thread-safe access.

pub mod audit_sink;
pub mod courier_service_repository;
pub mod rate_card_repository;
pub mod seller_policy_repository;

pub use audit_sink::InMemoryAuditSink;
pub use courier_service_repository::InMemoryCourierServiceRepository;
pub use rate_card_repository::InMemoryRateCardRepository;
pub use seller_policy_repository::InMemorySellerPolicyRepository;
