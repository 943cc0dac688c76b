use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

use serde::Serialize;

use thiserror::Error;

use crate::error::{error_chain_fmt, Error};

pub type RestResult<T> = Result<T, RestError>;

/// Errors returned from REST endpoints; collaborator details stay in the logs
#[derive(Error)]
pub enum RestError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Internal Server Error")]
    Internal(#[source] Error),
}

impl std::fmt::Debug for RestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<Error> for RestError {
    fn from(e: Error) -> Self {
        match e {
            Error::InvalidFrequency(msg) | Error::InvalidRequest(msg) => Self::BadRequest(msg),
            Error::InvalidToken => Self::BadRequest(e.to_string()),
            Error::NotFound | Error::CityNotFound => Self::NotFound(e.to_string()),
            Error::AlreadyExists | Error::AlreadyConfirmed => Self::Conflict(e.to_string()),
            Error::StoreUnavailable(_) | Error::ProviderUnavailable(_) => Self::Internal(e),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl ResponseError for RestError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
