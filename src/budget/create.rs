//! Budget creation page and endpoint.

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
    budget::{
        db::{create_budget, parse_budget_month},
        list::month_label,
    },
    category::{Category, get_all_categories},
    database_id::DatabaseId,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_date_today,
    transaction::TransactionKind,
    user::UserId,
};

/// The state needed for the new budget page.
#[derive(Debug, Clone)]
pub struct NewBudgetPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for NewBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for creating a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBudgetEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating a budget.
///
/// The month is kept as the raw "YYYY-MM" string from the HTML month input
/// and parsed with [parse_budget_month].
#[derive(Debug, Deserialize)]
pub struct BudgetFormData {
    /// The category the budget limits.
    pub category_id: DatabaseId,
    /// The month the budget applies to, e.g. "2025-06".
    pub month: String,
    /// The spending limit in dollars.
    pub amount: Decimal,
}

/// The shared form fields for the new and edit budget pages.
///
/// Budgets are spending limits, so only expense categories are offered.
pub(super) fn budget_form_fields(
    categories: &[Category],
    selected_category: Option<DatabaseId>,
    month: &str,
    amount: Option<Decimal>,
) -> Markup {
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
                option value="" disabled selected[selected_category.is_none()]
                {
                    "Select a category"
                }

                @for category in categories
                    .iter()
                    .filter(|category| category.kind == TransactionKind::Expense)
                {
                    option
                        value=(category.id)
                        selected[selected_category == Some(category.id)]
                    {
                        (category.name)
                    }
                }
            }
        }

        div
        {
            label
                for="month"
                class=(FORM_LABEL_STYLE)
            {
                "Month"
            }

            input
                name="month"
                id="month"
                type="month"
                required
                value=(month)
                class=(FORM_TEXT_INPUT_STYLE);
        }

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
                    value=[amount]
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn new_budget_view(
    categories: &[Category],
    default_month: &str,
    error_message: Option<&str>,
) -> Markup {
    let create_budget_route = endpoints::POST_BUDGET;
    let nav_bar = NavBar::new(endpoints::NEW_BUDGET_VIEW).into_html();
    let spinner = loading_spinner();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(create_budget_route)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Budget" }

                (budget_form_fields(categories, None, default_month, None))

                @if let Some(error_message) = error_message {
                    p
                    {
                        (error_message)
                    }
                }

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Create Budget"
                }
            }
        }
    };

    base("Create Budget", &[dollar_input_styles()], &content)
}

/// Renders the page for creating a budget.
pub async fn get_new_budget_page(
    State(state): State<NewBudgetPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let categories = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        get_all_categories(user_id, &connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for new budget page: {error}")
        })?
    };

    let today = local_date_today(&state.local_timezone)?;

    Ok(new_budget_view(&categories, &month_label(today), None).into_response())
}

/// Handle budget creation form submission. Redirects to the budgets view on
/// success.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<BudgetFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let render_form_error = |error: &Error| match get_all_categories(user_id, &connection) {
        Ok(categories) => {
            new_budget_view(&categories, &form.month, Some(&format!("Error: {error}")))
                .into_response()
        }
        Err(error) => {
            tracing::error!("could not get categories: {error}");
            error.into_alert_response()
        }
    };

    let month = match parse_budget_month(&form.month) {
        Ok(month) => month,
        Err(error) => {
            tracing::error!("could not parse budget month: {error}");
            return render_form_error(&error);
        }
    };

    match create_budget(&connection, user_id, form.category_id, month, form.amount) {
        Ok(_) => (
            HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::NonPositiveAmount(_)) => {
            tracing::error!("could not create budget: {error}");
            render_form_error(&error)
        }
        Err(error) => {
            tracing::error!("could not create budget: {error}");
            error.into_alert_response()
        }
    }
}
