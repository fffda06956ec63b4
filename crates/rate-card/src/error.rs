use crate::acquisition::AcquisitionError;
use crate::config::ConfigError;
use crate::pricing::CalculationError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Calculation(CalculationError),
    Acquisition(AcquisitionError),
    PositionNotFound(u64),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Calculation(err) => write!(f, "{}", err),
            AppError::Acquisition(err) => write!(f, "rate table unavailable: {}", err),
            AppError::PositionNotFound(id) => write!(f, "position {} not found", id),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Calculation(err) => Some(err),
            AppError::Acquisition(err) => Some(err),
            AppError::PositionNotFound(_) => None,
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Calculation(CalculationError::Validation(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            AppError::Calculation(CalculationError::RoleNotFound(_))
            | AppError::PositionNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Acquisition(_) => StatusCode::BAD_GATEWAY,
            AppError::Config(_) | AppError::Telemetry(_) | AppError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<CalculationError> for AppError {
    fn from(value: CalculationError) -> Self {
        Self::Calculation(value)
    }
}

impl From<crate::pricing::ValidationError> for AppError {
    fn from(value: crate::pricing::ValidationError) -> Self {
        Self::Calculation(CalculationError::Validation(value))
    }
}

impl From<AcquisitionError> for AppError {
    fn from(value: AcquisitionError) -> Self {
        Self::Acquisition(value)
    }
}
