use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use log::error;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::utils::result::{self, StdResult};

pub const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";
pub const POKEMON_NOT_FOUND: &str = "Pokemon not found";

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(result::Error),
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn pokemon_not_found() -> Self {
        Self::NotFound(String::from(POKEMON_NOT_FOUND))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::BadRequest(message) => json!({ "message": message }),
            Self::NotFound(message) => json!({ "error": message }),
            Self::Internal(_) => json!({ "error": INTERNAL_SERVER_ERROR }),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<result::Error> for AppError {
    fn from(error: result::Error) -> Self {
        error!(target: "pokedex", "ERROR: {:#}", error);
        Self::Internal(error)
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::BadRequest(errors.to_string())
    }
}

pub type Response<T = HttpResponse> = StdResult<T, AppError>;

#[cfg(test)]
mod test {
    use actix_web::body::to_bytes;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::utils::simple_error;

    async fn body_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.error_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[actix_web::test]
    async fn test_bad_request() {
        let (status, body) = body_of(AppError::bad_request("No image uploaded")).await;
        assert_eq!(StatusCode::BAD_REQUEST, status);
        assert_eq!(json!({ "message": "No image uploaded" }), body);
    }

    #[actix_web::test]
    async fn test_not_found() {
        let (status, body) = body_of(AppError::pokemon_not_found()).await;
        assert_eq!(StatusCode::NOT_FOUND, status);
        assert_eq!(json!({ "error": "Pokemon not found" }), body);
    }

    #[actix_web::test]
    async fn test_internal_hides_detail() {
        let err: AppError = simple_error!("connection refused").into();
        let (status, body) = body_of(err).await;
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, status);
        assert_eq!(json!({ "error": "Internal Server Error" }), body);
    }
}
