//! Displays the user's budgets.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    AppState, Error,
    budget::db::get_budgets_with_category,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    user::UserId,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The budget data to display in the view
#[derive(Debug, PartialEq)]
struct BudgetTableRow {
    month: Date,
    category_name: String,
    amount: Decimal,
    edit_url: String,
    delete_url: String,
}

/// Format a first-of-month date as "YYYY-MM" for display and month inputs.
pub(super) fn month_label(month: Date) -> String {
    format!("{:04}-{:02}", month.year(), month.month() as u8)
}

fn budgets_view(budgets: &[BudgetTableRow]) -> Markup {
    let create_budget_page_url = endpoints::NEW_BUDGET_VIEW;
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();

    let table_row = |budget: &BudgetTableRow| {
        let action_links = edit_delete_action_links(
            &budget.edit_url,
            &budget.delete_url,
            &format!(
                "Are you sure you want to delete the budget for '{}'? This cannot be undone.",
                budget.category_name
            ),
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    (month_label(budget.month))
                }

                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (budget.category_name)
                }

                td class="px-6 py-4 text-right"
                {
                    (format_currency(budget.amount))
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (action_links)
                    }
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
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Budgets" }

                    a href=(create_budget_page_url) class=(LINK_STYLE)
                    {
                        "Add Budget"
                    }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Month"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Category"
                                }
                                th scope="col" class="px-6 py-3 text-right"
                                {
                                    "Amount"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for budget in budgets {
                                (table_row(budget))
                            }

                            @if budgets.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No budgets found. Create a budget "
                                        a href=(create_budget_page_url) class=(LINK_STYLE)
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

    base("Budgets", &[], &content)
}

/// Renders the budgets page showing all of the user's budgets.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budgets: Vec<_> = get_budgets_with_category(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?
        .into_iter()
        .map(|entry| BudgetTableRow {
            month: entry.budget.month,
            category_name: entry.category_name,
            amount: entry.budget.amount,
            edit_url: format_endpoint(endpoints::EDIT_BUDGET_VIEW, entry.budget.id),
            delete_url: format_endpoint(endpoints::DELETE_BUDGET, entry.budget.id),
        })
        .collect();

    Ok(budgets_view(&budgets).into_response())
}
