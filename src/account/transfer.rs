//! Transfers money between two accounts.
//!
//! A transfer is stored as a paired expense and income transaction, one per
//! account, filed under the user's "Transfer" categories. Both rows are
//! written inside a single SQL transaction so a transfer can never be half
//! recorded.

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
    account::{Account, db::get_account, get_all_accounts},
    category::get_or_create_transfer_category,
    database_id::DatabaseId,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles,
    },
    money::validate_amount,
    navigation::NavBar,
    timezone::local_date_today,
    transaction::{Transaction, TransactionData, TransactionKind, create_transaction},
    user::UserId,
};

/// The state needed for the transfer page.
#[derive(Debug, Clone)]
pub struct TransferPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for executing a transfer.
#[derive(Debug, Clone)]
pub struct TransferEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransferEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for transferring money between two accounts.
#[derive(Debug, Deserialize)]
pub struct TransferFormData {
    /// The account the money comes out of.
    pub from_account_id: DatabaseId,
    /// The account the money goes into.
    pub to_account_id: DatabaseId,
    /// The amount of money in dollars.
    pub amount: Decimal,
    /// The date of the transfer.
    pub date: Date,
    /// An optional free-text note appended to both transaction notes.
    #[serde(default)]
    pub note: String,
}

/// Render the page for transferring money between accounts.
pub async fn get_transfer_page(
    State(state): State<TransferPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let accounts = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_accounts(user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve accounts for transfer page: {error}")
        })?
    };

    let max_date = local_date_today(&state.local_timezone)?;

    Ok(transfer_view(&accounts, max_date, "").into_response())
}

/// Handle transfer form submission. Redirects to the accounts view on
/// success.
pub async fn transfer_endpoint(
    State(state): State<TransferEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<TransferFormData>,
) -> Response {
    let mut connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match execute_transfer(&mut connection, user_id, &form) {
        Ok(_) => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::SameTransferAccount) => {
            let accounts = match get_all_accounts(user_id, &connection) {
                Ok(accounts) => accounts,
                Err(error) => return error.into_alert_response(),
            };

            transfer_form_view(&accounts, form.date, &format!("Error: {error}")).into_response()
        }
        Err(error) => {
            tracing::error!("could not transfer money: {error}");
            error.into_alert_response()
        }
    }
}

/// Record a transfer as a paired expense and income transaction.
///
/// # Errors
/// Returns:
/// - [Error::SameTransferAccount] if both accounts are the same,
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::InvalidAccount] if either account does not belong to the user,
/// - [Error::SqlError] if there is an unexpected SQL error.
pub fn execute_transfer(
    connection: &mut Connection,
    user_id: UserId,
    form: &TransferFormData,
) -> Result<(Transaction, Transaction), Error> {
    if form.from_account_id == form.to_account_id {
        return Err(Error::SameTransferAccount);
    }

    let amount = validate_amount(form.amount)?;
    let from_account = get_account(form.from_account_id, user_id, connection)
        .map_err(|_| Error::InvalidAccount(Some(form.from_account_id)))?;
    let to_account = get_account(form.to_account_id, user_id, connection)
        .map_err(|_| Error::InvalidAccount(Some(form.to_account_id)))?;

    let note_suffix = if form.note.trim().is_empty() {
        String::new()
    } else {
        format!(" {}", form.note.trim())
    };

    let sql_transaction = connection.transaction()?;

    let expense_category =
        get_or_create_transfer_category(user_id, TransactionKind::Expense, &sql_transaction)?;
    let income_category =
        get_or_create_transfer_category(user_id, TransactionKind::Income, &sql_transaction)?;

    let outgoing = create_transaction(
        &sql_transaction,
        user_id,
        TransactionData {
            account_id: from_account.id,
            category_id: expense_category.id,
            kind: TransactionKind::Expense,
            amount,
            date: form.date,
            note: format!("Transfer to {}.{note_suffix}", to_account.name),
        },
    )?;
    let incoming = create_transaction(
        &sql_transaction,
        user_id,
        TransactionData {
            account_id: to_account.id,
            category_id: income_category.id,
            kind: TransactionKind::Income,
            amount,
            date: form.date,
            note: format!("Transfer from {}.{note_suffix}", from_account.name),
        },
    )?;

    sql_transaction.commit()?;

    Ok((outgoing, incoming))
}

fn account_select(accounts: &[Account], name: &str, label: &str) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }

            select
                name=(name)
                id=(name)
                required
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" disabled selected { "Select an account" }

                @for account in accounts {
                    option value=(account.id) { (account.name) }
                }
            }
        }
    }
}

fn transfer_view(accounts: &[Account], max_date: Date, error_message: &str) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSFER_VIEW).into_html();
    let form = transfer_form_view(accounts, max_date, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Transfer Money", &[dollar_input_styles()], &content)
}

fn transfer_form_view(accounts: &[Account], max_date: Date, error_message: &str) -> Markup {
    let transfer_endpoint = endpoints::TRANSFER_API;

    html! {
        form
            hx-post=(transfer_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "Transfer Money" }

            (account_select(accounts, "from_account_id", "From Account"))

            (account_select(accounts, "to_account_id", "To Account"))

            div
            {
                label
                    for="amount"
                    class=(FORM_LABEL_STYLE)
                {
                    "Amount"
                }

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

            @if !error_message.is_empty() {
                p
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Transfer" }
        }
    }
}
