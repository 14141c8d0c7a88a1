use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::{auth::password::PasswordError, users::dto::ApiResponse, users::repo::StoreError};

/// Outcomes of the account service other than success.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Unknown email and wrong password are deliberately the same variant.
    #[error("Invalid credentials")]
    Authentication,
    #[error("User with email {0} already exists")]
    Conflict(String),
    #[error("User with ID {0} not found")]
    NotFound(i32),
    #[error("storage error: {0}")]
    Storage(#[source] StoreError),
    #[error(transparent)]
    Credential(#[from] PasswordError),
}

/// Everything a handler can answer with on the failure path.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Account(#[from] AccountError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Account(AccountError::Authentication) => StatusCode::UNAUTHORIZED,
            ApiError::Account(AccountError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Account(AccountError::Conflict(_)) => StatusCode::CONFLICT,
            ApiError::Account(AccountError::Storage(_) | AccountError::Credential(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to hand to clients; internal faults get a fixed text.
    pub fn public_message(&self) -> String {
        match self {
            ApiError::Account(AccountError::Storage(_)) => "Database error".to_string(),
            ApiError::Account(AccountError::Credential(_)) => {
                "Error processing password".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, %status, "request failed");
        } else {
            warn!(error = %self, %status, "request rejected");
        }
        (status, Json(ApiResponse::failure(self.public_message()))).into_response()
    }
}
