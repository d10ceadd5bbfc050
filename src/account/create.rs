//! Account creation page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::create_account,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles,
    },
    navigation::NavBar,
    user::UserId,
};

/// The state needed for creating an account.
#[derive(Debug, Clone)]
pub struct CreateAccountEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating an account.
#[derive(Debug, Deserialize)]
pub struct AccountFormData {
    /// The account name.
    pub name: String,
    /// The balance of the account before any recorded transactions.
    pub opening_balance: Decimal,
}

/// Render the account creation page.
pub async fn get_new_account_page() -> Response {
    new_account_view().into_response()
}

/// Handle account creation form submission.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<AccountFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(&connection, user_id, &form.name, form.opening_balance) {
        Ok(_) => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::EmptyAccountName | Error::DuplicateAccountName(_))) => {
            new_account_form_view(&form.name, form.opening_balance, &format!("Error: {error}"))
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating an account: {error}");

            error.into_alert_response()
        }
    }
}

fn new_account_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();
    let form = new_account_form_view("", Decimal::ZERO, "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Account", &[dollar_input_styles()], &content)
}

pub(super) fn account_form_fields(name: &str, opening_balance: Decimal) -> Markup {
    html! {
        div
        {
            label
                for="name"
                class=(FORM_LABEL_STYLE)
            {
                "Account Name"
            }

            input
                id="name"
                type="text"
                name="name"
                placeholder="Account Name"
                value=(name)
                required
                autofocus
                class=(FORM_TEXT_INPUT_STYLE);
        }

        div
        {
            label
                for="opening_balance"
                class=(FORM_LABEL_STYLE)
            {
                "Opening Balance"
            }

            div class="input-wrapper w-full"
            {
                input
                    id="opening_balance"
                    type="number"
                    name="opening_balance"
                    step="0.01"
                    value=(opening_balance)
                    required
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn new_account_form_view(name: &str, opening_balance: Decimal, error_message: &str) -> Markup {
    let create_account_endpoint = endpoints::POST_ACCOUNT;

    html! {
        form
            hx-post=(create_account_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (account_form_fields(name, opening_balance))

            @if !error_message.is_empty() {
                p
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Account" }
        }
    }
}
