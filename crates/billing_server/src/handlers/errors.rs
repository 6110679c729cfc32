use common::api::{ErrorBody, ErrorEnvelope};
use common::errors::{DateError, DocumentError, StoreError};
use hyper::StatusCode;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use super::response::{json_response, HttpResponse};
use crate::reports::ReportError;

// -----------------------------------------------------------------------------
// API errors (mapped onto HTTP status codes)
// -----------------------------------------------------------------------------
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("No data has been loaded: {0}")]
    NotInitialized(String),

    #[error("No route for {method} {path}")]
    RouteNotFound { method: String, path: String },

    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotInitialized(_) => ApiError::NotInitialized(err.to_string()),
            StoreError::Document(DocumentError::Serialization(_))
            | StoreError::Io { .. }
            | StoreError::Corrupt { .. }
            | StoreError::ResourceIdsExhausted => ApiError::InternalServerError(err.to_string()),
            StoreError::Document(inner) => ApiError::InvalidRequest(inner.to_string()),
        }
    }
}

impl From<DateError> for ApiError {
    fn from(err: DateError) -> Self {
        ApiError::InvalidRequest(err.to_string())
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::InternalServerError(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotInitialized(_) | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn into_response(self) -> HttpResponse {
        let status = self.status();
        let (code, details) = match &self {
            ApiError::InvalidRequest(reason) => ("InvalidRequest", json!({ "reason": reason })),
            ApiError::NotInitialized(reason) => ("NotInitialized", json!({ "reason": reason })),
            ApiError::RouteNotFound { method, path } => (
                "RouteNotFound",
                json!({ "method": method, "path": path }),
            ),
            ApiError::InternalServerError(reason) => {
                ("InternalServerError", json!({ "reason": reason }))
            }
        };

        if status.is_server_error() {
            error!(code, error = %self, "request failed");
        } else {
            warn!(code, error = %self, "request rejected");
        }

        json_response(
            status,
            &ErrorEnvelope {
                error: ErrorBody {
                    code: code.to_string(),
                    message: self.to_string(),
                    details,
                },
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn stored_data_problems_are_server_errors() {
        let corrupt = StoreError::Corrupt {
            path: PathBuf::from("data.xml"),
            source: DocumentError::Malformed("unexpected end".to_string()),
        };
        assert_eq!(ApiError::from(corrupt).status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            ApiError::from(StoreError::ResourceIdsExhausted).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn bad_uploads_are_client_errors() {
        let upload = StoreError::Document(DocumentError::InvalidNumber {
            field: "tiempo",
            value: "abc".to_string(),
        });
        assert_eq!(ApiError::from(upload).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::from(StoreError::NotInitialized(PathBuf::from("data.xml"))).status(),
            StatusCode::NOT_FOUND
        );
    }
}
