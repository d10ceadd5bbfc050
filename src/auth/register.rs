//! The registration page for creating a new account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    Error,
    AppState,
    account::create_account,
    auth::{
        DEFAULT_COOKIE_DURATION, PasswordHash, ValidatedPassword, log_in::email_input,
        set_auth_cookie,
    },
    category::create_category,
    endpoints,
    html::{
        FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base, loading_spinner, log_in_register,
        password_input,
    },
    internal_server_error::get_internal_server_error_redirect,
    transaction::TransactionKind,
    user::{UserId, create_user},
};

/// The minimum number of characters the password should have to be considered valid on the client side (server-side validation is done on top of this validation).
const PASSWORD_INPUT_MIN_LENGTH: u8 = 14;

fn confirm_password_input(min_length: u8, error_message: Option<&str>) -> Markup {
    html! {
        div
        {
            label
                for="confirm-password"
                class=(FORM_LABEL_STYLE)
            {
                "Confirm Password"
            }

            input
                type="password"
                name="confirm_password"
                id="confirm-password"
                placeholder="••••••••"
                class=(FORM_TEXT_INPUT_STYLE)
                required
                minlength=(min_length)
                autofocus[error_message.is_some()]
            ;

            @if let Some(error_message) = error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }
        }

    }
}

fn registration_form(
    email: &str,
    password: &str,
    email_error_message: Option<&str>,
    password_error_message: Option<&str>,
    confirm_password_error_message: Option<&str>,
) -> Markup {
    html! {
        form
            hx-post=(endpoints::USERS)
            hx-indicator="#indicator"
            hx-disabled-elt="#email, #password, #submit-button"
            class="space-y-4 md:space-y-6"
        {
            (email_input(email))

            @if let Some(error_message) = email_error_message
            {
                p class="text-red-500 text-base" { (error_message) }
            }

            (password_input(password, PASSWORD_INPUT_MIN_LENGTH, password_error_message))
            (confirm_password_input(PASSWORD_INPUT_MIN_LENGTH, confirm_password_error_message))

            button
                type="submit" id="submit-button" tabindex="0"
                class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 disabled:bg-blue-700
                    hover:enabled:bg-blue-600 hover:enabled:dark:bg-blue-700 text-white rounded"
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create Account"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already have an account? "

                a
                    href=(endpoints::LOG_IN_VIEW) tabindex="0"
                    class="font-semibold leading-6 text-blue-600 hover:text-blue-500 dark:text-blue-500 dark:hover:text-blue-400"
                {
                  "Log in here"
                }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let registration_form = registration_form("", "", None, None, None);
    let content = log_in_register("Create Account", &registration_form);
    base("Register", &[], &content).into_response()
}

/// The state needed for creating a new user.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl RegistrationState {
    /// Create the registration state with the default cookie duration.
    pub fn new(cookie_key: Key, db_connection: Arc<Mutex<Connection>>) -> Self {
        Self {
            cookie_key,
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

/// The raw data entered by the user in the registration form.
#[derive(Serialize, Deserialize)]
pub struct RegisterForm {
    /// The email to register with.
    pub email: String,
    /// The password to register with.
    pub password: String,
    /// A second copy of the password to catch typos.
    pub confirm_password: String,
}

/// Create the new user and the starter account and categories every new
/// ledger gets, all in a single SQL transaction.
fn create_user_with_defaults(
    connection: &mut Connection,
    email: &str,
    password_hash: PasswordHash,
) -> Result<UserId, Error> {
    let sql_transaction = connection.transaction()?;

    let user = create_user(email, password_hash, &sql_transaction)?;
    create_account(&sql_transaction, user.id, "Cash", Decimal::ZERO)?;
    create_category(&sql_transaction, user.id, "Salary", TransactionKind::Income)?;
    create_category(&sql_transaction, user.id, "Food", TransactionKind::Expense)?;

    sql_transaction.commit()?;

    Ok(user.id)
}

/// Handler for registration requests via the POST method.
///
/// On success the new user gets a "Cash" account and "Salary" and "Food"
/// categories, the auth cookie is set, and the client is redirected to the
/// dashboard page. Otherwise, the form is returned with an error message
/// explaining the problem.
///
/// # Panics
///
/// Panics if the lock for the database connection is already held by the same thread.
pub async fn register_user(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(user_data): Form<RegisterForm>,
) -> Response {
    if user_data.email.trim().is_empty() {
        return registration_form(
            &user_data.email,
            &user_data.password,
            Some("An email address is required."),
            None,
            None,
        )
        .into_response();
    }

    let validated_password = match ValidatedPassword::new(&user_data.password) {
        Ok(password) => password,
        Err(error) => {
            return registration_form(
                &user_data.email,
                &user_data.password,
                None,
                Some(error.to_string().as_ref()),
                None,
            )
            .into_response();
        }
    };

    if user_data.password != user_data.confirm_password {
        return registration_form(
            &user_data.email,
            &user_data.password,
            None,
            None,
            Some("Passwords do not match"),
        )
        .into_response();
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::error!("an error occurred while hashing a password: {e}");

            return get_internal_server_error_redirect();
        }
    };

    let user_id = {
        let mut connection = state
            .db_connection
            .lock()
            .expect("Could not acquire database lock");

        match create_user_with_defaults(&mut connection, user_data.email.trim(), password_hash) {
            Ok(user_id) => user_id,
            Err(Error::EmailTaken(_)) => {
                return registration_form(
                    &user_data.email,
                    &user_data.password,
                    Some("That email is already registered, please log in instead."),
                    None,
                    None,
                )
                .into_response();
            }
            Err(error) => {
                tracing::error!("An unhandled error occurred while inserting a new user: {error}");

                return get_internal_server_error_redirect();
            }
        }
    };

    match set_auth_cookie(jar, user_id, state.cookie_duration) {
        Ok(jar) => (
            StatusCode::SEE_OTHER,
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("An error occurred while setting the auth cookie: {e}");

            get_internal_server_error_redirect()
        }
    }
}
