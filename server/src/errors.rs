// src/errors.rs

use actix_web::{HttpResponse, ResponseError};
use laundrify::LaundrifyError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  Validation(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error(transparent)]
  Domain(#[from] LaundrifyError),
}

impl ResponseError for AppError {
  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    match self {
      AppError::Domain(LaundrifyError::Unauthorized) => HttpResponse::Unauthorized().json(json!({"error": "Unauthorized"})),
      // Hosted functions answer every other failure with 400 and a message.
      AppError::Domain(e) => HttpResponse::BadRequest().json(json!({"error": e.to_string()})),
      AppError::Validation(m) => HttpResponse::BadRequest().json(json!({"error": m})),
      AppError::Config(m) => {
        HttpResponse::InternalServerError().json(json!({"error": "Configuration issue", "detail": m}))
      }
    }
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;
