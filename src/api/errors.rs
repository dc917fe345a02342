//! HTTP error mapping
//!
//! Every failure leaves the service as `{"detail": "..."}` with a status that
//! matches its kind.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

use crate::recommend::RecommendError;

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Recommend(#[from] RecommendError),

    /// The request body could not be read as a recommendation request
    #[error("{}", .0.body_text())]
    Rejected(#[from] JsonRejection),
}

impl ApiError {
    #[inline]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Recommend(RecommendError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Recommend(RecommendError::Internal { .. }) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Rejected(rejection) => rejection.status(),
        }
    }

    #[inline]
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody {
            detail: self.to_string(),
        }
    }

    /// Log the error with appropriate level
    #[inline]
    pub fn log(&self) {
        match self {
            Self::Recommend(RecommendError::NotFound { .. }) => {
                warn!("Not found error: {}", self);
            }
            Self::Recommend(RecommendError::Internal { .. }) => {
                error!("Server error: {}", self);
            }
            Self::Rejected(_) => {
                warn!("Client error: {}", self);
            }
        }
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        self.log();
        (self.status(), Json(self.to_error_body())).into_response()
    }
}
