use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use colloquy_core::ColloquyError;
use tracing::warn;

/// A [`ColloquyError`] on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ColloquyError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self.0 {
            ColloquyError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            ColloquyError::DialogAlreadyFinished => StatusCode::BAD_REQUEST,
            ColloquyError::InvalidConfig(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ColloquyError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ColloquyError> for ApiError {
    fn from(err: ColloquyError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!(status = status.as_u16(), error = %self.0, "Request failed");
        }
        (status, Json(serde_json::json!({"error": self.0.to_string()}))).into_response()
    }
}
