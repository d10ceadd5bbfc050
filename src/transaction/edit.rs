//! Transaction editing page and endpoint.

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
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    category::{Category, get_all_categories},
    database_id::DatabaseId,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles,
    },
    navigation::NavBar,
    timezone::local_date_today,
    transaction::{
        Transaction,
        create::{TransactionFormData, account_select, category_select, transaction_kind_radio_group},
        db::{TransactionData, get_transaction, update_transaction},
    },
    user::UserId,
};

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a transaction.
#[derive(Debug, Clone)]
pub struct UpdateTransactionEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateTransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the transaction editing page.
pub async fn get_edit_transaction_page(
    Path(transaction_id): Path<DatabaseId>,
    State(state): State<EditTransactionPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let (transaction, accounts, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transaction = get_transaction(transaction_id, user_id, &connection)
            .inspect_err(|error| {
                tracing::error!("Failed to retrieve transaction {transaction_id}: {error}")
            })?;
        let accounts = get_all_accounts(user_id, &connection)?;
        let categories = get_all_categories(user_id, &connection)?;

        (transaction, accounts, categories)
    };

    let max_date = local_date_today(&state.local_timezone)?;

    Ok(edit_transaction_view(&transaction, max_date, &accounts, &categories).into_response())
}

/// Handle transaction update form submission.
pub async fn update_transaction_endpoint(
    Path(transaction_id): Path<DatabaseId>,
    State(state): State<UpdateTransactionEndpointState>,
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

    match update_transaction(transaction_id, user_id, data, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

fn edit_transaction_view(
    transaction: &Transaction,
    max_date: Date,
    accounts: &[Account],
    categories: &[Category],
) -> Markup {
    let edit_endpoint =
        endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, transaction.id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_TRANSACTION, transaction.id);
    let nav_bar = NavBar::new(&edit_endpoint).into_html();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_endpoint)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                (account_select(accounts, Some(transaction.account_id)))

                (category_select(categories, Some(transaction.category_id)))

                (transaction_kind_radio_group(transaction.kind))

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
                            value=(transaction.amount)
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
                        value=(transaction.date)
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
                        value=(transaction.note)
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Transaction" }
            }
        }
    };

    base("Edit Transaction", &[dollar_input_styles()], &content)
}
