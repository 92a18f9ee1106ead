use actix_web::{error, http::StatusCode, HttpRequest, HttpResponse, ResponseError};
use thiserror::Error;

use crate::models::ApiResponse;
use crate::repository::DbError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    ValidationMissing(String),

    #[error("{0}")]
    MalformedInput(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::ValidationMissing(_) | ApiError::MalformedInput(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            ApiError::Internal(detail) => {
                log::error!("Request failed: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(ApiResponse::failure(message))
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        if let Some(diesel_error) = e.downcast_ref::<diesel::result::Error>() {
            match diesel_error {
                diesel::result::Error::NotFound => {
                    return ApiError::NotFound("record not found".to_string());
                }
                diesel::result::Error::DatabaseError(diesel::result::DatabaseErrorKind::UniqueViolation, _) => {
                    return ApiError::Conflict("conflicts with an existing record".to_string());
                }
                _ => (),
            }
        }

        ApiError::Internal(e.to_string())
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(e: r2d2::Error) -> Self {
        ApiError::Internal(format!("database pool: {}", e))
    }
}

impl From<error::BlockingError> for ApiError {
    fn from(e: error::BlockingError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = match err {
        error::JsonPayloadError::ContentType => {
            HttpResponse::UnsupportedMediaType().json(ApiResponse::failure("Unsupported Media Type"))
        }
        error::JsonPayloadError::Deserialize(ref e) => {
            ApiError::MalformedInput(format!("invalid JSON payload: {}", e)).error_response()
        }
        _ => ApiError::MalformedInput(err.to_string()).error_response(),
    };
    error::InternalError::from_response(err, response).into()
}

pub fn query_error_handler(err: error::QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let response = ApiError::MalformedInput(err.to_string()).error_response();
    error::InternalError::from_response(err, response).into()
}
