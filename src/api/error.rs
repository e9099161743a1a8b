use crate::errors::Error;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

/// Field under which problems with the body as a whole are reported.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Self::Validation { errors } => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            Self::NotFound { .. } => StatusCode::NOT_FOUND.into_response(),
            Self::Unauthorized { message } => {
                (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response()
            }
            Self::Forbidden { message } => {
                (StatusCode::FORBIDDEN, Json(json!({ "error": message }))).into_response()
            }
            Self::Conflict { message } => {
                (StatusCode::CONFLICT, Json(json!({ "error": message }))).into_response()
            }
            Self::IdentityProvider(e) => {
                warn!("Identity provider request failed: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "Could not reach the identity provider" })),
                )
                    .into_response()
            }
            other => {
                error!("Request failed: {}", other);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::invalid(NON_FIELD_ERRORS, rejection.body_text())
    }
}
