use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use instctl_core::Error;

/// A core error on its way out as an HTTP response
#[derive(Debug)]
pub struct ApiError(pub Error);

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ApiError {
    /// HTTP status for the wrapped error
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            e if e.is_client_error() => StatusCode::BAD_REQUEST,
            Error::MultipleStaticIps { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.0.to_string();

        if status.is_server_error() {
            tracing::error!(code = status.as_u16(), error = %message, "Request failed");
        } else {
            tracing::warn!(code = status.as_u16(), error = %message, "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: message,
            code: status.as_u16(),
        });

        (status, body).into_response()
    }
}
