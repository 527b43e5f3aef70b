use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Failures talking to the wells dataset.
#[derive(Debug, Error)]
pub enum DataAccessError {
    #[error("failed to open database: {0}")]
    Connection(String),

    #[error("failed to get database connection from pool: {0}")]
    Pool(String),

    #[error("query failed: {cause}\n{sql}")]
    Query { sql: String, cause: String },

    #[error("query task aborted: {0}")]
    Task(String),
}

/// Errors surfaced at the HTTP boundary. The client only ever sees the
/// display text; internal causes stay in the server log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid column")]
    InvalidColumn,

    #[error("Not found")]
    NotFound,

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal server error")]
    DataAccess(#[from] DataAccessError),

    #[error("Internal server error")]
    Serialization(#[from] serde_json::Error),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidColumn | ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::DataAccess(_) | ApiError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::DataAccess(cause) => log::error!("500 Error: {cause}"),
            ApiError::Serialization(cause) => {
                log::error!("500 Error: failed to serialize response: {cause}")
            }
            other => log::error!("{} Error: {other}", other.status_code().as_u16()),
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}
