//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;

use crate::{
    alert::Alert, database_id::DatabaseId, internal_server_error::InternalServerError,
    not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Either the user ID or expiry cookie is missing from the cookie jar in
    /// the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing a date string, e.g. the expiry cookie
    /// date-time or a budget month from a form.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not parse date string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The email address is already registered.
    #[error("the email \"{0}\" is already registered")]
    EmailTaken(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// An empty string was used to create an account name.
    #[error("Account name cannot be empty")]
    EmptyAccountName,

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The category ID used to create a transaction or budget did not match a
    /// category owned by the user.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<DatabaseId>),

    /// The account ID used to create a transaction did not match an account
    /// owned by the user.
    #[error("the account ID does not refer to a valid account")]
    InvalidAccount(Option<DatabaseId>),

    /// A zero or negative amount was used for a transaction or transfer.
    ///
    /// Transaction direction is recorded by the income/expense kind, so the
    /// amount itself must always be positive.
    #[error("{0} is not a positive amount")]
    NonPositiveAmount(Decimal),

    /// An amount exceeded the twelve digit money precision.
    #[error("{0} exceeds the maximum supported amount")]
    AmountTooLarge(Decimal),

    /// The specified account name already exists for this user.
    #[error("the account \"{0}\" already exists")]
    DuplicateAccountName(String),

    /// The specified category name and kind already exist for this user.
    #[error("the category \"{0}\" already exists")]
    DuplicateCategoryName(String),

    /// Tried to delete an account that is still referenced by transactions.
    #[error("the account is used by one or more transactions")]
    AccountInUse,

    /// Tried to delete a category that is still referenced by transactions.
    #[error("the category is used by one or more transactions")]
    CategoryInUse,

    /// A transfer used the same account as both source and destination.
    #[error("cannot transfer money from an account to itself")]
    SameTransferAccount,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to update a category that does not exist
    #[error("tried to update a category that is not in the database")]
    UpdateMissingCategory,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed. The account
            // and category writes map this to a duplicate-name error with the
            // offending name at the call site; anything reaching this point is
            // the email uniqueness constraint or a schema bug.
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::NonPositiveAmount(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!("{amount} is not a positive amount. Enter an amount greater than zero."),
                },
            ),
            Error::AmountTooLarge(amount) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid amount".to_owned(),
                    details: format!(
                        "{amount} is too large. Enter an amount with at most twelve digits."
                    ),
                },
            ),
            Error::InvalidCategory(category_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category ID".to_owned(),
                    details: format!("Could not find a category with the ID {category_id:?}"),
                },
            ),
            Error::InvalidAccount(account_id) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid account ID".to_owned(),
                    details: format!("Could not find an account with the ID {account_id:?}"),
                },
            ),
            Error::EmptyAccountName => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid account name".to_owned(),
                    details: "The account name cannot be empty.".to_owned(),
                },
            ),
            Error::EmptyCategoryName => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid category name".to_owned(),
                    details: "The category name cannot be empty.".to_owned(),
                },
            ),
            Error::SameTransferAccount => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid transfer".to_owned(),
                    details: "The from and to accounts must be different.".to_owned(),
                },
            ),
            Error::AccountInUse => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not delete account".to_owned(),
                    details: "You can't delete this account because it is used by \
                    one or more transactions."
                        .to_owned(),
                },
            ),
            Error::CategoryInUse => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "You can't delete this category because it is used by \
                    one or more transactions."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update transaction".to_owned(),
                    details: "The transaction could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingTransaction => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete transaction".to_owned(),
                    details: "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingAccount => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update account".to_owned(),
                    details: "The account could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingAccount => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete account".to_owned(),
                    details: "The account could not be found. \
                    Try refreshing the page to see if the account has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update category".to_owned(),
                    details: "The category could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingCategory => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete category".to_owned(),
                    details: "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted."
                        .to_owned(),
                },
            ),
            Error::UpdateMissingBudget => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not update budget".to_owned(),
                    details: "The budget could not be found.".to_owned(),
                },
            ),
            Error::DeleteMissingBudget => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Could not delete budget".to_owned(),
                    details: "The budget could not be found. \
                    Try refreshing the page to see if the budget has already been deleted."
                        .to_owned(),
                },
            ),
            Error::DuplicateAccountName(name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Account Name".to_owned(),
                    details: format!(
                        "The account {name} already exists. \
                        Choose a different account name, or edit or delete the existing account.",
                    ),
                },
            ),
            Error::DuplicateCategoryName(name) => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Duplicate Category".to_owned(),
                    details: format!(
                        "A category named {name} with this type already exists. \
                        Choose a different name or type, or edit or delete the existing category.",
                    ),
                },
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Something went wrong".to_owned(),
                    details:
                        "An unexpected error occurred, check the server logs for more details."
                            .to_owned(),
                },
            ),
        };

        (status_code, alert.into_html()).into_response()
    }
}
