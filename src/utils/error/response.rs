//! HTTP response handling for errors

use super::types::ControllerError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

impl ResponseError for ControllerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ControllerError::Validation(_) | ControllerError::Parsing(_) => {
                StatusCode::BAD_REQUEST
            }
            ControllerError::Conflict(_) => StatusCode::CONFLICT,
            ControllerError::NotFound(_) => StatusCode::NOT_FOUND,
            ControllerError::Upstream { .. } | ControllerError::HttpClient(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let (error_code, message) = match self {
            ControllerError::Validation(_) => ("VALIDATION_ERROR", self.to_string()),
            ControllerError::Parsing(_) => ("PARSING_ERROR", self.to_string()),
            ControllerError::Conflict(_) => ("CONFLICT", self.to_string()),
            ControllerError::NotFound(_) => ("NOT_FOUND", self.to_string()),
            ControllerError::Upstream { .. } | ControllerError::HttpClient(_) => {
                ("UPSTREAM_ERROR", self.to_string())
            }
            ControllerError::Database(_) => {
                ("DATABASE_ERROR", "Database operation failed".to_string())
            }
            #[cfg(feature = "redis")]
            ControllerError::Redis(_) => ("CACHE_ERROR", "Cache operation failed".to_string()),
            _ => (
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
            ),
        };

        let error_response = ErrorResponse {
            error: ErrorDetail {
                code: error_code.to_string(),
                message,
                timestamp: chrono::Utc::now().timestamp(),
            },
        };

        HttpResponse::build(self.status_code()).json(error_response)
    }
}

/// Standard error response format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error detail structure
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    pub timestamp: i64,
}
