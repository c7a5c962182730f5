//! Offset based pagination.

use super::error::ClientError;
use serde::{Deserialize, Serialize};
use utoipa::IntoParams;

/// Pagination parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// The number of elements to skip.
    skip: Option<i64>,
    /// The maximum number of elements to return.
    limit: Option<i64>,
}

impl PaginationParams {
    /// Constructs pagination parameters.
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip: Some(skip),
            limit: Some(limit),
        }
    }

    /// Rejects negative values. There is no upper bound.
    pub fn validate(self) -> Result<Self, ClientError> {
        if self.offset() < 0 {
            return Err(ClientError::BadRequest("skip must not be negative".to_string()));
        }
        if self.limit() < 0 {
            return Err(ClientError::BadRequest("limit must not be negative".to_string()));
        }
        Ok(self)
    }

    /// The number of elements to skip, 0 by default.
    pub fn offset(&self) -> i64 {
        self.skip.unwrap_or(0)
    }

    /// The maximum number of elements, 10 by default.
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10)
    }
}
