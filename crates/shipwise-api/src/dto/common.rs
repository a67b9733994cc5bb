//! Common DTOs used across the API

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};
use shipwise_core::traits::{PaginatedResponse, Pagination, PaginationMeta};
use shipwise_core::AppError;
use shipwise_services::constants::DEFAULT_ACTOR;
use std::future::{ready, Ready};
use validator::Validate;

/// Header naming who asked for a change, recorded in rate card history
pub const ACTOR_HEADER: &str = "X-Actor";

/// Longest accepted actor name
const MAX_ACTOR_LEN: usize = 128;

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a success response with data
    pub fn success(data: T) -> Self {
        Self {
            data,
            message: None,
        }
    }

    /// Create a success response with data and message
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: Some(message.into()),
        }
    }
}

/// Pagination query parameters
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaginationParams {
    /// Page number (1-indexed)
    #[serde(default = "default_page")]
    #[validate(range(min = 1))]
    pub page: i64,

    /// Items per page
    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 1000))]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    50
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    pub fn to_pagination(&self) -> Pagination {
        Pagination::new(self.page, self.per_page)
    }

    /// Create paginated response
    pub fn paginate<T>(&self, data: Vec<T>, total: i64) -> PaginatedResponse<T> {
        PaginatedResponse {
            data,
            pagination: PaginationMeta::new(total, self.page, self.per_page),
        }
    }
}

/// Caller identity taken from the `X-Actor` header
///
/// Authentication happens upstream; a missing header is recorded as
/// `system`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor(pub String);

impl Actor {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let Some(value) = req.headers().get(ACTOR_HEADER) else {
            return ready(Ok(Actor(DEFAULT_ACTOR.to_string())));
        };

        let actor = match value.to_str() {
            Ok(s) => s.trim(),
            Err(_) => {
                return ready(Err(AppError::InvalidInput(format!(
                    "{} must be visible ASCII",
                    ACTOR_HEADER
                ))))
            }
        };

        if actor.is_empty() {
            ready(Ok(Actor(DEFAULT_ACTOR.to_string())))
        } else if actor.len() > MAX_ACTOR_LEN {
            ready(Err(AppError::InvalidInput(format!(
                "{} longer than {} characters",
                ACTOR_HEADER, MAX_ACTOR_LEN
            ))))
        } else {
            ready(Ok(Actor(actor.to_string())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_pagination_params() {
        let params = PaginationParams {
            page: 3,
            per_page: 20,
        };
        let p = params.to_pagination();
        assert_eq!(p.offset(), 40);
        assert_eq!(p.limit(), 20);

        let page = params.paginate(vec![1, 2], 45);
        assert_eq!(page.pagination.total_pages, 3);
    }

    #[test]
    fn test_api_response() {
        let resp = ApiResponse::success("test");
        assert_eq!(resp.data, "test");
        assert!(resp.message.is_none());

        let resp = ApiResponse::with_message("data", "success");
        assert_eq!(resp.message, Some("success".to_string()));
    }

    #[actix_web::test]
    async fn test_actor_header() {
        let req = TestRequest::default()
            .insert_header((ACTOR_HEADER, "ops@shipwise"))
            .to_http_request();
        let actor = Actor::extract(&req).await.unwrap();
        assert_eq!(actor.as_str(), "ops@shipwise");

        let req = TestRequest::default().to_http_request();
        let actor = Actor::extract(&req).await.unwrap();
        assert_eq!(actor.as_str(), "system");
    }
}
