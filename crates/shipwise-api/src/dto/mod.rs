//! Data Transfer Objects (DTOs) for API requests and responses

pub mod common;
pub mod quote;
pub mod rate_card;

pub use common::*;
pub use quote::*;
pub use rate_card::*;
