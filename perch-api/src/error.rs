use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use perch_core::ReservationError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    GoneError(String),
    ServiceUnavailableError(String),
    InternalServerError(String),
    Anyhow(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::GoneError(msg) => (StatusCode::GONE, msg),
            AppError::ServiceUnavailableError(msg) => {
                tracing::error!("Storage unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
            AppError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}

/// Coordinator rejections mapped to the user-facing responses. Kept as
/// a helper because the blanket anyhow `From` above already claims the
/// `From<ReservationError>` impl.
pub fn reservation_error(err: ReservationError) -> AppError {
    match err {
        ReservationError::AlreadyTaken => {
            AppError::ConflictError("This seat was just taken".to_string())
        }
        ReservationError::SlotNotFound(key) => {
            AppError::NotFoundError(format!("No such slot: {}", key))
        }
        ReservationError::HoldNotFound => {
            AppError::NotFoundError("Hold not found or already used".to_string())
        }
        ReservationError::HoldExpired => {
            AppError::GoneError("Your hold expired, please select again".to_string())
        }
        ReservationError::StorageUnavailable(e) => {
            AppError::ServiceUnavailableError(e.to_string())
        }
    }
}
