use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};

pub type Result<T> = std::result::Result<T, AppError>;

/// Errors shared by the store, the gateway client, config loading and the REST layer
///
/// Per-invoice billing failures are not reported through this type; the
/// billing module wraps it in its own outcome types.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Bad input, including illegal status transitions
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Gateway client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        AppError::NotFound(resource.into())
    }

    pub fn gateway(msg: impl Into<String>) -> Self {
        AppError::Gateway(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }

    /// Message safe to hand to an API client
    ///
    /// Server-side failures are reduced to a generic message; the detail only goes to the log.
    pub fn public_message(&self) -> String {
        if self.status_code().is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Json(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Gateway(_) | AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Configuration(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(status).json(serde_json::json!({
            "error": {
                "message": self.public_message(),
                "code": status.as_u16(),
            }
        }))
    }
}
