//! Dashboard HTTP handler and view rendering.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::live_balances,
    budget::get_budgets_with_category,
    dashboard::{
        aggregation::{budget_vs_actual, daily_expense_series, monthly_summary, six_month_trend},
        cards::summary_cards,
        charts::{DashboardChart, budget_chart, charts_script, daily_expenses_chart, trend_chart},
        tables::live_balances_table,
    },
    endpoints,
    html::{HeadElement, base, link},
    navigation::NavBar,
    timezone::local_date_today,
    transaction::get_all_transactions,
    user::UserId,
};

/// The state needed for displaying the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    /// The database connection for reading the ledger.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display a page with an overview of the user's finances: summary cards,
/// charts and the live account balances.
///
/// Everything is recomputed from the ledger on each request.
pub async fn get_dashboard_page(
    State(state): State<DashboardState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    let transactions = get_all_transactions(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get transactions: {error}"))?;

    if transactions.is_empty() {
        return Ok(dashboard_no_data_view(nav_bar).into_response());
    }

    let balances = live_balances(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not compute live balances: {error}"))?;
    let budgets = get_budgets_with_category(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;

    let today = local_date_today(&state.local_timezone)?;

    let accounts: Vec<_> = balances
        .iter()
        .map(|balance| balance.account.clone())
        .collect();
    let summary = monthly_summary(today, &accounts, &transactions);

    let (daily_labels, daily_values) = daily_expense_series(today, &transactions);
    let (trend_labels, trend_values) = six_month_trend(today, &transactions);
    let budget_data = budget_vs_actual(today, &budgets, &transactions);

    let mut charts = vec![
        DashboardChart {
            id: "daily-expenses-chart",
            options: daily_expenses_chart(daily_labels, daily_values).to_string(),
        },
        DashboardChart {
            id: "expense-trend-chart",
            options: trend_chart(trend_labels, trend_values).to_string(),
        },
    ];

    if !budget_data.labels.is_empty() {
        charts.push(DashboardChart {
            id: "budget-chart",
            options: budget_chart(budget_data).to_string(),
        });
    }

    let cards = summary_cards(&summary);
    let balances_table = live_balances_table(&balances);

    Ok(dashboard_view(nav_bar, &cards, &charts, &balances_table).into_response())
}

/// Renders the dashboard page when no transaction data exists.
fn dashboard_no_data_view(nav_bar: NavBar<'_>) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "adding a transaction");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Your summary and charts will show up here once you have some
                transactions. Start by " (new_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

/// Renders the main dashboard page with cards, charts and the balances table.
fn dashboard_view(
    nav_bar: NavBar<'_>,
    cards: &Markup,
    charts: &[DashboardChart],
    balances_table: &Markup,
) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (cards)

            section
                id="charts"
                class="w-full mx-auto mb-4"
            {
                div class="grid grid-cols-1 xl:grid-cols-2 gap-4"
                {
                    @for chart in charts {
                        div
                            id=(chart.id)
                            class="min-h-[380px] rounded dark:bg-gray-100"
                        {}
                    }

                    (balances_table)
                }
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(charts),
    ];

    base("Dashboard", &scripts, &content)
}
