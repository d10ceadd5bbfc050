//! Transaction creation page and endpoint.

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
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    category::{Category, get_all_categories},
    database_id::DatabaseId,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_date_today,
    transaction::{TransactionKind, db::TransactionData, db::create_transaction},
    user::UserId,
};

/// The state needed for the new transaction page.
#[derive(Debug, Clone)]
pub struct NewTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for creating a transaction.
#[derive(Debug, Clone)]
pub struct CreateTransactionEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateTransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating a transaction.
#[derive(Debug, Deserialize)]
pub struct TransactionFormData {
    /// The account the money went into or came out of.
    pub account_id: DatabaseId,
    /// The category to file the transaction under.
    pub category_id: DatabaseId,
    /// Whether this is income or an expense.
    pub kind: TransactionKind,
    /// The amount of money in dollars.
    pub amount: Decimal,
    /// The date when the transaction occurred.
    pub date: Date,
    /// A free-text note.
    #[serde(default)]
    pub note: String,
}

/// Renders the page for creating a transaction.
pub async fn get_new_transaction_page(
    State(state): State<NewTransactionPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let (accounts, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        (
            get_all_accounts(user_id, &connection).inspect_err(|error| {
                tracing::error!("Failed to retrieve accounts for new transaction page: {error}")
            })?,
            get_all_categories(user_id, &connection).inspect_err(|error| {
                tracing::error!("Failed to retrieve categories for new transaction page: {error}")
            })?,
        )
    };

    let max_date = local_date_today(&state.local_timezone)?;

    Ok(new_transaction_view(max_date, &accounts, &categories).into_response())
}

/// Handle transaction creation form submission. Redirects to the transactions
/// view on success.
pub async fn create_transaction_endpoint(
    State(state): State<CreateTransactionEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<TransactionFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let data = TransactionData {
        account_id: form.account_id,
        category_id: form.category_id,
        kind: form.kind,
        amount: form.amount,
        date: form.date,
        note: form.note,
    };

    match create_transaction(&connection, user_id, data) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not create transaction: {error}");
            error.into_alert_response()
        }
    }
}

pub(super) fn account_select(accounts: &[Account], selected: Option<DatabaseId>) -> Markup {
    html! {
        div
        {
            label for="account_id" class=(FORM_LABEL_STYLE) { "Account" }

            select
                name="account_id"
                id="account_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" disabled selected[selected.is_none()] { "Select an account" }

                @for account in accounts {
                    option
                        value=(account.id)
                        selected[selected == Some(account.id)]
                    {
                        (account.name)
                    }
                }
            }
        }
    }
}

pub(super) fn category_select(categories: &[Category], selected: Option<DatabaseId>) -> Markup {
    let label = |category: &Category| {
        let kind = match category.kind {
            TransactionKind::Income => "Income",
            TransactionKind::Expense => "Expense",
        };

        format!("{} ({kind})", category.name)
    };

    html! {
        div
        {
            label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }

            select
                name="category_id"
                id="category_id"
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" disabled selected[selected.is_none()] { "Select a category" }

                @for category in categories {
                    option
                        value=(category.id)
                        selected[selected == Some(category.id)]
                    {
                        (label(category))
                    }
                }
            }
        }
    }
}

pub(super) fn transaction_kind_radio_group(selected: TransactionKind) -> Markup {
    html! {
        fieldset
        {
            legend class=(FORM_LABEL_STYLE) { "Type" }

            div class=(FORM_RADIO_GROUP_STYLE)
            {
                div class="flex items-center gap-2"
                {
                    input
                        id="kind-expense"
                        type="radio"
                        name="kind"
                        value="expense"
                        checked[selected == TransactionKind::Expense]
                        required
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="kind-expense" class=(FORM_RADIO_LABEL_STYLE) { "Expense" }
                }

                div class="flex items-center gap-2"
                {
                    input
                        id="kind-income"
                        type="radio"
                        name="kind"
                        value="income"
                        checked[selected == TransactionKind::Income]
                        required
                        class=(FORM_RADIO_INPUT_STYLE);

                    label for="kind-income" class=(FORM_RADIO_LABEL_STYLE) { "Income" }
                }
            }
        }
    }
}

fn new_transaction_view(max_date: Date, accounts: &[Account], categories: &[Category]) -> Markup {
    let create_transaction_route = endpoints::POST_TRANSACTION;
    let nav_bar = NavBar::new(endpoints::NEW_TRANSACTION_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(create_transaction_route)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Transaction" }

                (account_select(accounts, None))

                (category_select(categories, None))

                (transaction_kind_radio_group(TransactionKind::Expense))

                div
                {
                    label
                        for="amount"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Amount"
                    }

                    // w-full needed to ensure input takes the full width when prefilled with a value
                    div class="input-wrapper w-full"
                    {
                        input
                            name="amount"
                            id="amount"
                            type="number"
                            step="0.01"
                            min="0.01"
                            placeholder="0.00"
                            required
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);
                    }
                }

                div
                {
                    label
                        for="date"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Date"
                    }

                    input
                        name="date"
                        id="date"
                        type="date"
                        max=(max_date)
                        required
                        value=(max_date)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label
                        for="note"
                        class=(FORM_LABEL_STYLE)
                    {
                        "Note"
                    }

                    input
                        name="note"
                        id="note"
                        type="text"
                        placeholder="Note"
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Create Transaction"
                }
            }
        }
    };

    base("Create Transaction", &[dollar_input_styles()], &content)
}


#[cfg(test)]
mod create_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Extension, Form, extract::State, http::StatusCode, response::IntoResponse};
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        account::create_account,
        auth::PasswordHash,
        category::create_category,
        db::initialize,
        endpoints,
        test_utils::assert_hx_redirect,
        transaction::{TransactionKind, db::get_transaction},
        user::{UserId, create_user},
    };

    use super::{CreateTransactionEndpointState, TransactionFormData, create_transaction_endpoint};

    fn get_test_state() -> (CreateTransactionEndpointState, UserId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "foo@bar.baz",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            CreateTransactionEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    #[tokio::test]
    async fn can_create_transaction() {
        let (state, user_id) = get_test_state();
        let (account_id, category_id) = {
            let connection = state.db_connection.lock().unwrap();
            let account = create_account(&connection, user_id, "Checking", Decimal::ZERO).unwrap();
            let category =
                create_category(&connection, user_id, "Groceries", TransactionKind::Expense)
                    .unwrap();
            (account.id, category.id)
        };

        let form = TransactionFormData {
            account_id,
            category_id,
            kind: TransactionKind::Expense,
            amount: "12.34".parse().unwrap(),
            date: date!(2025 - 06 - 15),
            note: "weekly shop".to_owned(),
        };

        let response = create_transaction_endpoint(State(state.clone()), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_hx_redirect(&response, endpoints::TRANSACTIONS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        let transaction = get_transaction(1, user_id, &connection).unwrap();
        assert_eq!(transaction.amount, "12.34".parse::<Decimal>().unwrap());
        assert_eq!(transaction.note, "weekly shop");
    }

    #[tokio::test]
    async fn create_transaction_with_zero_amount_returns_error() {
        let (state, user_id) = get_test_state();
        let (account_id, category_id) = {
            let connection = state.db_connection.lock().unwrap();
            let account = create_account(&connection, user_id, "Checking", Decimal::ZERO).unwrap();
            let category =
                create_category(&connection, user_id, "Groceries", TransactionKind::Expense)
                    .unwrap();
            (account.id, category.id)
        };

        let form = TransactionFormData {
            account_id,
            category_id,
            kind: TransactionKind::Expense,
            amount: Decimal::ZERO,
            date: date!(2025 - 06 - 15),
            note: String::new(),
        };

        let response = create_transaction_endpoint(State(state), Extension(user_id), Form(form))
            .await
            .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn create_transaction_with_unowned_account_returns_error() {
        let (state, user_id) = get_test_state();
        let (account_id, category_id, other_user_id) = {
            let connection = state.db_connection.lock().unwrap();
            let other_user = create_user(
                "qux@bar.baz",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap();
            let account = create_account(&connection, user_id, "Checking", Decimal::ZERO).unwrap();
            let category =
                create_category(&connection, user_id, "Groceries", TransactionKind::Expense)
                    .unwrap();
            (account.id, category.id, other_user.id)
        };

        let form = TransactionFormData {
            account_id,
            category_id,
            kind: TransactionKind::Expense,
            amount: "12.34".parse().unwrap(),
            date: date!(2025 - 06 - 15),
            note: String::new(),
        };

        let response =
            create_transaction_endpoint(State(state), Extension(other_user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
