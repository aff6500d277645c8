use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EndpointError>;

#[derive(Error, Debug)]
pub enum EndpointError {
    #[error("Email is required")]
    MissingEmail,

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger_core::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl ResponseError for EndpointError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string()
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            EndpointError::MissingEmail => StatusCode::BAD_REQUEST,
            EndpointError::Ledger(_) => StatusCode::INTERNAL_SERVER_ERROR,
            EndpointError::Metrics(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
