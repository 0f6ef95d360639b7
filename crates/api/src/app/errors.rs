use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use orderdesk_core::{OrderId, ValidationErrors};
use orderdesk_infra::{OrdersServiceError, RepositoryError};

/// Everything a handler can fail with, already shaped for the wire.
#[derive(Debug)]
pub enum ApiError {
    Validation(ValidationErrors),
    NotFound(OrderId),
    InvalidId(String),
    /// Body or query string rejected before reaching a handler.
    Rejection { status: StatusCode, message: String },
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                axum::Json(json!({
                    "error": "validation_error",
                    "message": errors.to_string(),
                    "details": errors.violations(),
                })),
            )
                .into_response(),
            ApiError::NotFound(id) => json_error(
                StatusCode::NOT_FOUND,
                "not_found",
                OrdersServiceError::OrderNotFound(id).to_string(),
            ),
            ApiError::InvalidId(raw) => json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_id",
                format!("{raw:?} is not a valid order id"),
            ),
            ApiError::Rejection { status, message } => json_error(status, "invalid_request", message),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "request failed");
                json_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error",
                )
            }
        }
    }
}

impl From<OrdersServiceError> for ApiError {
    fn from(err: OrdersServiceError) -> Self {
        match err {
            OrdersServiceError::Validation(v) => ApiError::Validation(v),
            OrdersServiceError::OrderNotFound(id) => ApiError::NotFound(id),
            OrdersServiceError::Repository(e) => e.into(),
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::InvalidUpdate(v) => ApiError::Validation(v),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match &rejection {
            JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            other => other.status(),
        };
        ApiError::Rejection {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejection {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: rejection.body_text(),
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_errors_map_to_statuses() {
        let id = OrderId::new();
        let cases = [
            (
                ApiError::from(OrdersServiceError::Validation(ValidationErrors::single(
                    "order",
                    "must not be empty",
                ))),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(OrdersServiceError::OrderNotFound(id)),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(OrdersServiceError::Repository(RepositoryError::storage(
                    "insert order",
                    "connection reset",
                ))),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::InvalidId("nope".into()), StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn validation_details_keep_every_violation() {
        let mut errors = ValidationErrors::new();
        errors.push("order.0.size", "bad");
        errors.push("order.0.quantity", "bad");
        match ApiError::from(OrdersServiceError::Validation(errors)) {
            ApiError::Validation(v) => assert_eq!(v.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }
}
