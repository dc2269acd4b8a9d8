// giftshop-core/src/http/action.rs
//
// Uniform `{ success, data | error, code, fieldErrors }` envelope for every route.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{error, warn};

use crate::{Error, FieldErrors};

const INTERNAL_MESSAGE: &str = "Something went wrong. Please try again later.";

#[derive(Debug, Serialize)]
struct SuccessBody<T> {
    success: bool,
    data: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    error: String,
    code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    field_errors: Option<FieldErrors>,
}

/// Successful outcome of a route.
#[derive(Debug)]
pub struct ActionResult<T>(pub T);

impl<T: Serialize> IntoResponse for ActionResult<T> {
    fn into_response(self) -> Response {
        Json(SuccessBody { success: true, data: self.0 }).into_response()
    }
}

/// Failed outcome. Built from `Error`; internal failures keep their text in the
/// log and hand the client a generic message.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
    field_errors: Option<FieldErrors>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        Error::Conflict(_) | Error::OutOfStock(_) | Error::InsufficientFunds { .. } => {
            StatusCode::CONFLICT
        }
        Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let status = status_for(&err);
        let code = err.code();

        if err.is_internal() {
            error!("Request failed: {}", err);
            return ApiError {
                status,
                code,
                message: INTERNAL_MESSAGE.to_string(),
                field_errors: None,
            };
        }

        warn!("Request rejected ({}): {}", code, err);
        match err {
            Error::Validation(fields) => ApiError {
                status,
                code,
                message: "Please correct the highlighted fields.".to_string(),
                field_errors: Some(fields),
            },
            Error::NotFound(what) => ApiError {
                status,
                code,
                message: format!("Not found: {}", what),
                field_errors: None,
            },
            other => ApiError {
                status,
                code,
                message: other.to_string(),
                field_errors: None,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
            code: self.code,
            field_errors: self.field_errors,
        };
        (self.status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<ActionResult<T>, ApiError>;

/// Wraps a service outcome for a handler.
pub fn respond<T>(outcome: Result<T, Error>) -> ApiResult<T> {
    outcome.map(ActionResult).map_err(ApiError::from)
}
