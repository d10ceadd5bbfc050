//! Alert fragments for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that htmx swaps into the
//! `#alert-container` element at the bottom of every page.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

/// A success or error message to show the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// An error with a short message and a longer explanation.
    Error {
        /// A short summary of what went wrong.
        message: String,
        /// What the user can do about it.
        details: String,
    },
    /// A success message with no further details.
    SuccessSimple {
        /// A short summary of what happened.
        message: String,
    },
}

impl Alert {
    /// Render the alert as an out-of-band htmx fragment.
    pub fn into_html(self) -> Markup {
        let (container_style, icon, message, details) = match self {
            Alert::Error { message, details } => (
                "flex items-start p-4 mb-4 text-red-800 rounded-lg bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 shadow",
                "✘",
                message,
                details,
            ),
            Alert::SuccessSimple { message } => (
                "flex items-start p-4 mb-4 text-green-800 rounded-lg bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 shadow",
                "✔",
                message,
                String::new(),
            ),
        };

        html!(
            div id="alert-container" hx-swap-oob="innerHTML"
            {
                div class=(container_style) role="alert"
                {
                    span class="text-lg me-3" aria-hidden="true" { (icon) }

                    div class="text-sm"
                    {
                        p class="font-medium" { (message) }

                        @if !details.is_empty() {
                            p { (details) }
                        }
                    }

                    button
                        type="button"
                        class="ms-auto -mx-1.5 -my-1.5 rounded-lg p-1.5 \
                            hover:bg-gray-200 dark:hover:bg-gray-700"
                        aria-label="Close"
                        onclick="this.closest('[role=alert]').remove()"
                    {
                        "✕"
                    }
                }
            }
        )
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_contains_message_and_details() {
        let markup = Alert::Error {
            message: "Something broke".to_owned(),
            details: "Try turning it off and on again.".to_owned(),
        }
        .into_html();

        let html = Html::parse_fragment(&markup.into_string());
        let selector = Selector::parse("[role='alert']").unwrap();
        let alert = html.select(&selector).next().expect("no alert rendered");
        let text = alert.text().collect::<String>();

        assert!(text.contains("Something broke"));
        assert!(text.contains("Try turning it off and on again."));
    }

    #[test]
    fn success_alert_omits_details_paragraph() {
        let markup = Alert::SuccessSimple {
            message: "Saved".to_owned(),
        }
        .into_html();

        let html = Html::parse_fragment(&markup.into_string());
        let selector = Selector::parse("[role='alert'] p").unwrap();
        let paragraphs: Vec<_> = html.select(&selector).collect();

        assert_eq!(paragraphs.len(), 1);
    }
}
