use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Request-level error taxonomy. Client-fault variants carry the message sent
/// back to the caller; internal variants are logged and surfaced as an opaque
/// message only.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("password hashing failed")]
    Hash,
    #[error(transparent)]
    Store(#[from] mongodb::error::Error),
    #[error(transparent)]
    Data(#[from] mongodb::bson::de::Error),
}

impl ApiError {
    fn client_message(&self) -> &str {
        match self {
            ApiError::Validation(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message) => message,
            ApiError::Hash | ApiError::Store(_) | ApiError::Data(_) => "Internal server error",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Hash | ApiError::Store(_) | ApiError::Data(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Store(error) => log::error!("store operation failed: {error}"),
            ApiError::Data(error) => log::error!("document decoding failed: {error}"),
            ApiError::Hash => log::error!("password hashing failed"),
            _ => (),
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.client_message() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn client_fault_variants_map_to_client_codes() {
        let validation = ApiError::Validation(String::from("Missing fields"));
        let not_found = ApiError::NotFound(String::from("Incident not found"));
        let conflict = ApiError::Conflict(String::from("Email already exists"));

        assert_eq!(validation.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(not_found.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(conflict.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn internal_variants_map_to_500() {
        assert_eq!(ApiError::Hash.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[actix_web::test]
    async fn error_body_is_json_with_error_key() {
        let response = ApiError::Conflict(String::from("Email already exists")).error_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Email already exists" }));
    }

    #[actix_web::test]
    async fn internal_detail_is_not_leaked() {
        let response = ApiError::Hash.error_response();
        let bytes = to_bytes(response.into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "error": "Internal server error" }));
    }
}
