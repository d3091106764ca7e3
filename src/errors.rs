use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

/// Failures raised inside the proxy. None of these messages ever reach a
/// client; handlers log them and answer with an [`ApiError`].
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to connect to database: {0}")]
    Connection(String),

    #[error("no upload folder is mapped to route '{0}'")]
    Configuration(String),

    #[error("object store upload failed: {0}")]
    Upload(String),

    #[error("database operation failed: {0}")]
    DatabaseOperation(String),

    #[error("document cannot be stored: {0}")]
    Document(String),

    #[error("invalid request body: {0}")]
    BadRequest(String),

    #[error("failed to write upload: {0}")]
    Io(#[from] std::io::Error),
}

impl From<mongodb::error::Error> for Error {
    fn from(e: mongodb::error::Error) -> Self {
        Error::DatabaseOperation(e.to_string())
    }
}

impl From<mongodb::bson::ser::Error> for Error {
    fn from(e: mongodb::bson::ser::Error) -> Self {
        Error::Document(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// What a client gets to see when a request fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiError {
    RetrieveFailed,
    SaveFailed,
    InvalidBody,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl ApiError {
    pub fn message(&self) -> &'static str {
        match self {
            ApiError::RetrieveFailed => "Failed to retrieve data.",
            ApiError::SaveFailed => "Failed to save data.",
            ApiError::InvalidBody => "Invalid request body.",
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::RetrieveFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::SaveFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidBody => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.message(),
        })
    }
}
