//! # HTTP Gateway
//!
//! JSON REST API over the calculation service, the risk register and the
//! exporter. Every JSON response uses the [`ApiResponse`] envelope; exports
//! are served as file downloads.

mod server;

pub use server::{router, run};

use std::sync::Arc;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::calculation::RiskCalculationService;
use crate::config::RiskwiseConfig;
use crate::error::RiskwiseError;
use crate::register::RiskRegister;

/// Shared state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub register: RiskRegister,
    pub calculator: RiskCalculationService,
    pub config: Arc<RiskwiseConfig>,
    started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: RiskwiseConfig, register: RiskRegister) -> Self {
        Self {
            calculator: RiskCalculationService::new(config.calculation.clone()),
            register,
            config: Arc::new(config),
            started_at: Utc::now(),
        }
    }

    /// Uptime in seconds since the state was created.
    pub fn uptime_secs(&self) -> u64 {
        let elapsed = Utc::now() - self.started_at;
        elapsed.num_seconds().max(0) as u64
    }
}

/// Uniform response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
            message: None,
        }
    }
}

/// Handler error rendered as a failed envelope.
#[derive(Debug)]
pub enum ApiError {
    /// Request body or query could not be decoded.
    BadRequest(String),
    Service(RiskwiseError),
}

impl From<RiskwiseError> for ApiError {
    fn from(err: RiskwiseError) -> Self {
        ApiError::Service(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(RiskwiseError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Service(RiskwiseError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::BadRequest(msg) => msg.clone(),
            ApiError::Service(err) => {
                if status.is_server_error() {
                    error!(error = %err, "Request failed");
                }
                err.client_message()
            }
        };
        (status, Json(ApiResponse::<()>::failure(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_empty_fields() {
        let ok = serde_json::to_value(ApiResponse::ok(3, "listo")).unwrap();
        assert_eq!(
            ok,
            serde_json::json!({"success": true, "data": 3, "message": "listo"})
        );

        let failed = serde_json::to_value(ApiResponse::<()>::failure("mal")).unwrap();
        assert_eq!(failed, serde_json::json!({"success": false, "error": "mal"}));
    }

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST),
            (
                RiskwiseError::Validation("x".into()).into(),
                StatusCode::BAD_REQUEST,
            ),
            (
                RiskwiseError::NotFound("x".into()).into(),
                StatusCode::NOT_FOUND,
            ),
            (
                RiskwiseError::Computation("x".into()).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                RiskwiseError::Register(crate::error::RegisterError::LockPoisoned).into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(err.status(), status);
        }
    }

    #[test]
    fn test_uptime_starts_near_zero() {
        let state = AppState::new(RiskwiseConfig::default(), RiskRegister::in_memory());
        assert!(state.uptime_secs() < 2);
    }
}
