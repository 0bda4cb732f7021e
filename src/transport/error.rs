use crate::game::errors::RoomError;
use crate::protocol::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Room(#[from] RoomError),
    #[error("internal error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Room(error) => match error {
                RoomError::RoomNotFound(_) | RoomError::UserNotFound { .. } => StatusCode::NOT_FOUND,
                RoomError::RoomFull(_)
                | RoomError::UserAlreadyInRoom(_)
                | RoomError::UserBusy(_)
                | RoomError::NoFreeCell => StatusCode::CONFLICT,
                RoomError::PathUnreachable { .. } | RoomError::InvalidMessage(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                RoomError::RoomIdGenerationExhausted { .. } => StatusCode::SERVICE_UNAVAILABLE,
            },
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, "request failed");
        }
        (
            status,
            Json(ErrorResponse {
                ok: false,
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
