use crate::views;
use axum::extract::rejection::FormRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::FromRequest;
use tracing::error;

/// Wrapper for [axum::Form] which answers unreadable submissions with our own error page
#[derive(FromRequest)]
#[from_request(via(axum::Form), rejection(FormErrorResponse))]
pub struct Form<T>(pub T);

/// Response type representing a form body which could not be parsed
pub struct FormErrorResponse {
    parse_problem: String,
}

impl From<FormRejection> for FormErrorResponse {
    fn from(value: FormRejection) -> Self {
        FormErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for FormErrorResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            views::error_page("Bad Request", &format!("The submitted form could not be read: {}", self.parse_problem)),
        )
            .into_response()
    }
}

/// Response type that wraps unexpected failures. The cause is logged and the visitor gets a generic 500 page.
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);

        (
            StatusCode::INTERNAL_SERVER_ERROR,
            views::error_page("Internal Server Error", "Something went wrong while handling your request."),
        )
            .into_response()
    }
}

impl From<anyhow::Error> for GenericErrorResponse {
    fn from(value: anyhow::Error) -> Self {
        GenericErrorResponse(value)
    }
}

pub struct NotFoundResponse;

impl IntoResponse for NotFoundResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            views::error_page("Not Found", "The requested item could not be found."),
        )
            .into_response()
    }
}

/// Response for a `next` parameter which points away from this site
#[cfg_attr(test, derive(Debug))]
pub struct UnsafeRedirectResponse;

impl IntoResponse for UnsafeRedirectResponse {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            views::error_page("Bad Request", "The requested redirect target is not allowed."),
        )
            .into_response()
    }
}
