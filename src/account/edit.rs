//! Account editing page and endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension, Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    AppState, Error,
    account::{AccountFormData, create::account_form_fields, get_account, update_account},
    database_id::DatabaseId,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    user::UserId,
};

/// The state needed for the edit account page.
#[derive(Debug, Clone)]
pub struct EditAccountPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating an account.
#[derive(Debug, Clone)]
pub struct UpdateAccountEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateAccountEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the account editing page.
pub async fn get_edit_account_page(
    Path(account_id): Path<DatabaseId>,
    State(state): State<EditAccountPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_ACCOUNT, account_id);

    match get_account(account_id, user_id, &connection) {
        Ok(account) => Ok(edit_account_view(
            &edit_endpoint,
            &update_endpoint,
            &account.name,
            account.opening_balance,
            "",
        )
        .into_response()),
        Err(error) => {
            let error_message = match error {
                Error::NotFound => "Account not found",
                _ => {
                    tracing::error!("Failed to retrieve account {account_id}: {error}");
                    "Failed to load account"
                }
            };

            Ok(edit_account_view(
                &edit_endpoint,
                &update_endpoint,
                "",
                Decimal::ZERO,
                error_message,
            )
            .into_response())
        }
    }
}

/// Handle account update form submission.
pub async fn update_account_endpoint(
    Path(account_id): Path<DatabaseId>,
    State(state): State<UpdateAccountEndpointState>,
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

    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_ACCOUNT, account_id);

    match update_account(
        account_id,
        user_id,
        &form.name,
        form.opening_balance,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::EmptyAccountName | Error::DuplicateAccountName(_))) => {
            edit_account_form_view(
                &update_endpoint,
                &form.name,
                form.opening_balance,
                &format!("Error: {error}"),
            )
            .into_response()
        }
        Err(Error::UpdateMissingAccount) => Error::UpdateMissingAccount.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating account {account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_account_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    name: &str,
    opening_balance: Decimal,
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint).into_html();
    let form = edit_account_form_view(update_endpoint, name, opening_balance, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Account", &[dollar_input_styles()], &content)
}

fn edit_account_form_view(
    update_endpoint: &str,
    name: &str,
    opening_balance: Decimal,
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
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

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Account" }
        }
    }
}

#[cfg(test)]
mod edit_account_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use rust_decimal::Decimal;

    use crate::{
        account::{AccountFormData, create_account, get_account},
        auth::PasswordHash,
        db::initialize,
        endpoints,
        test_utils::{
            assert_content_type, assert_form_error_message, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document, parse_html_fragment,
        },
        user::{UserId, create_user},
    };

    use super::{
        EditAccountPageState, UpdateAccountEndpointState, get_edit_account_page,
        update_account_endpoint,
    };

    fn get_test_connection() -> (Arc<Mutex<Connection>>, UserId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "foo@bar.baz",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (Arc::new(Mutex::new(connection)), user.id)
    }

    #[tokio::test]
    async fn get_edit_account_page_succeeds() {
        let (db_connection, user_id) = get_test_connection();
        let account = create_account(
            &db_connection.lock().unwrap(),
            user_id,
            "Checking",
            "100.00".parse().unwrap(),
        )
        .expect("Could not create test account");
        let state = EditAccountPageState { db_connection };

        let response = get_edit_account_page(Path(account.id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::PUT_ACCOUNT, account.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Checking");
        assert_form_input_with_value(&form, "opening_balance", "number", "100.00");
        assert_form_submit_button_with_text(&form, "Update Account");
    }

    #[tokio::test]
    async fn get_edit_account_page_with_invalid_id_shows_error() {
        let (db_connection, user_id) = get_test_connection();
        let state = EditAccountPageState { db_connection };
        let invalid_id = 999999;

        let response = get_edit_account_page(Path(invalid_id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Account not found");
    }

    #[tokio::test]
    async fn update_account_endpoint_succeeds() {
        let (db_connection, user_id) = get_test_connection();
        let account = create_account(
            &db_connection.lock().unwrap(),
            user_id,
            "Checking",
            Decimal::ZERO,
        )
        .unwrap();
        let state = UpdateAccountEndpointState {
            db_connection: db_connection.clone(),
        };

        let form = AccountFormData {
            name: "Everyday".to_owned(),
            opening_balance: "25.00".parse().unwrap(),
        };

        let response = update_account_endpoint(
            Path(account.id),
            State(state),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::ACCOUNTS_VIEW);

        let connection = db_connection.lock().unwrap();
        let updated = get_account(account.id, user_id, &connection).unwrap();
        assert_eq!(updated.name, "Everyday");
        assert_eq!(updated.opening_balance, "25.00".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn update_account_endpoint_with_invalid_id_returns_not_found() {
        let (db_connection, user_id) = get_test_connection();
        let state = UpdateAccountEndpointState { db_connection };
        let invalid_id = 999999;
        let form = AccountFormData {
            name: "Everyday".to_owned(),
            opening_balance: Decimal::ZERO,
        };

        let response =
            update_account_endpoint(Path(invalid_id), State(state), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_account_endpoint_rejects_rename_to_existing() {
        let (db_connection, user_id) = get_test_connection();
        let account = {
            let connection = db_connection.lock().unwrap();
            create_account(&connection, user_id, "Checking", Decimal::ZERO).unwrap();
            create_account(&connection, user_id, "Savings", Decimal::ZERO).unwrap()
        };
        let state = UpdateAccountEndpointState { db_connection };

        let form = AccountFormData {
            name: "Checking".to_owned(),
            opening_balance: Decimal::ZERO,
        };

        let response = update_account_endpoint(
            Path(account.id),
            State(state),
            Extension(user_id),
            Form(form),
        )
        .await
        .into_response();

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: the account \"Checking\" already exists");
    }
}
