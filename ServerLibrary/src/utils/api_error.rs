use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;
use crate::inference::utils::prediction::ErrorResponse;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("File must be an image")]
    UnsupportedMediaType,
    #[error("Unable to decode image: {0}")]
    DecodeError(String),
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
    #[error("Invalid API key")]
    Unauthorized,
    #[error("Model not loaded")]
    ModelNotLoaded,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::UnsupportedMediaType => StatusCode::BAD_REQUEST,
            ApiError::DecodeError(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::ModelNotLoaded => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            detail: self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_status_codes() {
        assert_eq!(ApiError::UnsupportedMediaType.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::DecodeError("truncated".to_string()).status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::ModelNotLoaded.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn detail_strings_match_the_public_contract() {
        assert_eq!(ApiError::UnsupportedMediaType.to_string(), "File must be an image");
        assert_eq!(ApiError::Unauthorized.to_string(), "Invalid API key");
        assert_eq!(ApiError::ModelNotLoaded.to_string(), "Model not loaded");
    }
}
