//! The 500 internal server error page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{endpoints, html::error_view};

/// Describes an internal server error page with a suggested fix.
pub struct InternalServerError<'a> {
    /// A short description of what went wrong.
    pub description: &'a str,
    /// What the user can do about it.
    pub fix: &'a str,
}

impl Default for InternalServerError<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

impl IntoResponse for InternalServerError<'_> {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_view("Error", "500", self.description, self.fix),
        )
            .into_response()
    }
}

/// Route handler that displays the internal server error page.
pub async fn get_internal_server_error_page() -> Response {
    InternalServerError::default().into_response()
}

/// An htmx redirect to the internal server error page.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}
