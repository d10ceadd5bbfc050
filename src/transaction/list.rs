//! Displays the user's transactions with search and account filters.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts},
    database_id::DatabaseId,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base, edit_delete_action_links,
        format_currency,
    },
    money::amount_from_row,
    navigation::NavBar,
    transaction::{TransactionKind, kind_from_row},
    user::UserId,
};

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TransactionsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The filters the client can apply to the transactions page.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionsQuery {
    /// Case-insensitive search over transaction notes and category names.
    #[serde(default)]
    pub q: String,
    /// Restrict the listing to a single account.
    #[serde(default)]
    pub account_id: Option<DatabaseId>,
}

/// The transaction data to display in the view
#[derive(Debug, PartialEq)]
struct TransactionTableRow {
    date: Date,
    note: String,
    category_name: String,
    account_name: String,
    kind: TransactionKind,
    amount: Decimal,
    edit_url: String,
    delete_url: String,
}

/// Renders the transactions page showing the user's transactions, newest
/// first, filtered by the query.
pub async fn get_transactions_page(
    State(state): State<TransactionsPageState>,
    Query(query): Query<TransactionsQuery>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = get_all_accounts(user_id, &connection)?;
    let transactions = get_transaction_rows(user_id, &query, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    Ok(transactions_view(&transactions, &accounts, &query).into_response())
}

fn get_transaction_rows(
    user_id: UserId,
    query: &TransactionsQuery,
    connection: &Connection,
) -> Result<Vec<TransactionTableRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.date, t.note, c.name, a.name, t.kind, t.amount \
            FROM txn t \
            JOIN category c ON c.id = t.category_id \
            JOIN account a ON a.id = t.account_id \
            WHERE t.user_id = ?1 \
            AND (?2 = '' \
                OR t.note LIKE '%' || ?2 || '%' COLLATE NOCASE \
                OR c.name LIKE '%' || ?2 || '%' COLLATE NOCASE) \
            AND (?3 IS NULL OR t.account_id = ?3) \
            ORDER BY t.date DESC, t.id DESC",
        )?
        .query_map(
            (user_id.as_i64(), query.q.trim(), query.account_id),
            |row| {
                let id: DatabaseId = row.get(0)?;

                Ok(TransactionTableRow {
                    date: row.get(1)?,
                    note: row.get(2)?,
                    category_name: row.get(3)?,
                    account_name: row.get(4)?,
                    kind: kind_from_row(row, 5)?,
                    amount: amount_from_row(row, 6)?,
                    edit_url: format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, id),
                    delete_url: format_endpoint(endpoints::DELETE_TRANSACTION, id),
                })
            },
        )?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}

fn filter_form_view(accounts: &[Account], query: &TransactionsQuery) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            class="flex flex-wrap items-end gap-2"
        {
            input
                name="q"
                id="q"
                type="search"
                placeholder="Search notes and categories"
                value=(query.q)
                class=(FORM_TEXT_INPUT_STYLE);

            select
                name="account_id"
                id="account_id"
                class=(FORM_TEXT_INPUT_STYLE)
            {
                option value="" selected[query.account_id.is_none()] { "All accounts" }

                @for account in accounts {
                    option
                        value=(account.id)
                        selected[query.account_id == Some(account.id)]
                    {
                        (account.name)
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Filter" }
        }
    }
}

fn transactions_view(
    transactions: &[TransactionTableRow],
    accounts: &[Account],
    query: &TransactionsQuery,
) -> Markup {
    let create_transaction_page_url = endpoints::NEW_TRANSACTION_VIEW;
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let kind_label = |kind: TransactionKind| match kind {
        TransactionKind::Income => "Income",
        TransactionKind::Expense => "Expense",
    };

    let table_row = |transaction: &TransactionTableRow| {
        let action_links = edit_delete_action_links(
            &transaction.edit_url,
            &transaction.delete_url,
            "Are you sure you want to delete this transaction? This cannot be undone.",
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (transaction.date) }
                td class=(TABLE_CELL_STYLE) { (transaction.note) }
                td class=(TABLE_CELL_STYLE) { (transaction.category_name) }
                td class=(TABLE_CELL_STYLE) { (transaction.account_name) }
                td class=(TABLE_CELL_STYLE) { (kind_label(transaction.kind)) }
                td class=(TABLE_CELL_STYLE) { (format_currency(transaction.amount)) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4" { (action_links) }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end gap-2"
                {
                    h1 class="text-xl font-bold" { "Transactions" }

                    a href=(create_transaction_page_url) class=(LINK_STYLE)
                    {
                        "Add Transaction"
                    }
                }

                (filter_form_view(accounts, query))

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                (table_row(transaction))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="7"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions found. Create a transaction "
                                        a href=(create_transaction_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Transactions", &[], &content)
}

#[cfg(test)]
mod transactions_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Query, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use scraper::Selector;
    use time::macros::date;

    use crate::{
        account::create_account,
        auth::PasswordHash,
        category::create_category,
        database_id::DatabaseId,
        db::initialize,
        test_utils::{assert_content_type, assert_valid_html, parse_html_document},
        transaction::{
            TransactionKind,
            db::{TransactionData, create_transaction},
        },
        user::{UserId, create_user},
    };

    use super::{TransactionsPageState, TransactionsQuery, get_transactions_page};

    fn get_test_state() -> (TransactionsPageState, UserId) {
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
            TransactionsPageState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    fn seed_transactions(state: &TransactionsPageState, user_id: UserId) -> (DatabaseId, DatabaseId) {
        let connection = state.db_connection.lock().unwrap();
        let checking = create_account(&connection, user_id, "Checking", Decimal::ZERO).unwrap();
        let savings = create_account(&connection, user_id, "Savings", Decimal::ZERO).unwrap();
        let groceries =
            create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();
        let salary =
            create_category(&connection, user_id, "Salary", TransactionKind::Income).unwrap();

        create_transaction(
            &connection,
            user_id,
            TransactionData {
                account_id: checking.id,
                category_id: groceries.id,
                kind: TransactionKind::Expense,
                amount: "12.34".parse().unwrap(),
                date: date!(2025 - 06 - 15),
                note: "weekly shop".to_owned(),
            },
        )
        .unwrap();
        create_transaction(
            &connection,
            user_id,
            TransactionData {
                account_id: savings.id,
                category_id: salary.id,
                kind: TransactionKind::Income,
                amount: "2500.00".parse().unwrap(),
                date: date!(2025 - 06 - 01),
                note: "june pay".to_owned(),
            },
        )
        .unwrap();

        (checking.id, savings.id)
    }

    async fn get_row_texts(
        state: TransactionsPageState,
        query: TransactionsQuery,
        user_id: UserId,
    ) -> Vec<String> {
        let response = get_transactions_page(State(state), Query(query), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let row_selector = Selector::parse("tbody tr").unwrap();
        html.select(&row_selector)
            .map(|row| row.text().collect::<String>())
            .collect()
    }

    #[tokio::test]
    async fn displays_transactions_newest_first() {
        let (state, user_id) = get_test_state();
        seed_transactions(&state, user_id);

        let rows = get_row_texts(state, TransactionsQuery::default(), user_id).await;

        assert_eq!(rows.len(), 2, "want 2 table rows, got {}", rows.len());
        assert!(rows[0].contains("weekly shop") && rows[0].contains("Groceries"));
        assert!(rows[1].contains("june pay") && rows[1].contains("Salary"));
    }

    #[tokio::test]
    async fn search_matches_note_case_insensitively() {
        let (state, user_id) = get_test_state();
        seed_transactions(&state, user_id);

        let query = TransactionsQuery {
            q: "WEEKLY".to_owned(),
            account_id: None,
        };
        let rows = get_row_texts(state, query, user_id).await;

        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("weekly shop"));
    }

    #[tokio::test]
    async fn search_matches_category_name() {
        let (state, user_id) = get_test_state();
        seed_transactions(&state, user_id);

        let query = TransactionsQuery {
            q: "salary".to_owned(),
            account_id: None,
        };
        let rows = get_row_texts(state, query, user_id).await;

        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("june pay"));
    }

    #[tokio::test]
    async fn account_filter_restricts_rows() {
        let (state, user_id) = get_test_state();
        let (_, savings_id) = seed_transactions(&state, user_id);

        let query = TransactionsQuery {
            q: String::new(),
            account_id: Some(savings_id),
        };
        let rows = get_row_texts(state, query, user_id).await;

        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("Savings"));
    }

    #[tokio::test]
    async fn search_with_no_matches_shows_empty_message() {
        let (state, user_id) = get_test_state();
        seed_transactions(&state, user_id);

        let query = TransactionsQuery {
            q: "holiday".to_owned(),
            account_id: None,
        };
        let rows = get_row_texts(state, query, user_id).await;

        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("No transactions found"));
    }

    #[tokio::test]
    async fn does_not_display_other_users_transactions() {
        let (state, user_id) = get_test_state();
        seed_transactions(&state, user_id);
        let other_user_id = {
            let connection = state.db_connection.lock().unwrap();
            create_user(
                "qux@bar.baz",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap()
            .id
        };

        let rows = get_row_texts(state, TransactionsQuery::default(), other_user_id).await;

        assert_eq!(rows.len(), 1);
        assert!(rows[0].contains("No transactions found"));
    }
}
