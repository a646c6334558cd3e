//! HTTP-facing error type and its status mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::models::variant::PayloadError;
use crate::services::alert_service::AlertServiceError;
use crate::services::disposition_service::DispositionError;
use crate::services::teams_service::NotifyError;
use crate::services::warehouse::WarehouseError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("login required")]
    NoSession,
    #[error(transparent)]
    Payload(#[from] PayloadError),
    #[error(transparent)]
    Warehouse(#[from] WarehouseError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("{0}")]
    Conflict(String),
    #[error("cannot encode annotation: {0}")]
    Encode(#[from] serde_json::Error),
}

impl From<AlertServiceError> for ApiError {
    fn from(e: AlertServiceError) -> Self {
        match e {
            AlertServiceError::Warehouse(e) => ApiError::Warehouse(e),
            AlertServiceError::Encode(e) => ApiError::Encode(e),
        }
    }
}

impl From<DispositionError> for ApiError {
    fn from(e: DispositionError) -> Self {
        match e {
            DispositionError::Notify(e) => ApiError::Notify(e),
            DispositionError::Record(e) => e.into(),
            DispositionError::Transition(e) => ApiError::Conflict(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NoSession => StatusCode::UNAUTHORIZED,
            ApiError::Warehouse(WarehouseError::Unauthorized(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Payload(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Warehouse(_) => StatusCode::BAD_GATEWAY,
            ApiError::Notify(NotifyError::NotConfigured) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Notify(_) => StatusCode::BAD_GATEWAY,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {self}");
        } else {
            tracing::debug!("Request rejected: {self}");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
