//! The 404 not found page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::html::error_view;

/// Marker type that renders as the 404 page.
pub struct NotFoundError;

impl IntoResponse for NotFoundError {
    fn into_response(self) -> Response {
        (
            StatusCode::NOT_FOUND,
            error_view(
                "Not Found",
                "404",
                "Sorry, we can't find that page.",
                "Check the URL or head back to the dashboard.",
            ),
        )
            .into_response()
    }
}

/// The fallback route handler for unknown paths.
pub async fn get_404_not_found() -> Response {
    NotFoundError.into_response()
}
