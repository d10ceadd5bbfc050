//! Budget editing page and endpoint.

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
    budget::{
        create::{BudgetFormData, budget_form_fields},
        db::{get_budget, parse_budget_month, update_budget},
        list::month_label,
    },
    category::{Category, get_all_categories},
    database_id::DatabaseId,
    endpoints,
    html::{BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles},
    navigation::NavBar,
    user::UserId,
};

/// The state needed for the edit budget page.
#[derive(Debug, Clone)]
pub struct EditBudgetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a budget.
#[derive(Debug, Clone)]
pub struct UpdateBudgetEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateBudgetEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the budget editing page.
pub async fn get_edit_budget_page(
    Path(budget_id): Path<DatabaseId>,
    State(state): State<EditBudgetPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(user_id, &connection).inspect_err(|error| {
        tracing::error!("Failed to retrieve categories for edit budget page: {error}")
    })?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_BUDGET_VIEW, budget_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_BUDGET, budget_id);

    match get_budget(budget_id, user_id, &connection) {
        Ok(budget) => Ok(edit_budget_view(
            &edit_endpoint,
            &update_endpoint,
            &categories,
            Some(budget.category_id),
            &month_label(budget.month),
            Some(budget.amount),
            "",
        )
        .into_response()),
        Err(error) => {
            let error_message = match error {
                Error::NotFound => "Budget not found",
                _ => {
                    tracing::error!("Failed to retrieve budget {budget_id}: {error}");
                    "Failed to load budget"
                }
            };

            Ok(edit_budget_view(
                &edit_endpoint,
                &update_endpoint,
                &categories,
                None,
                "",
                None,
                error_message,
            )
            .into_response())
        }
    }
}

/// Handle budget update form submission.
pub async fn update_budget_endpoint(
    Path(budget_id): Path<DatabaseId>,
    State(state): State<UpdateBudgetEndpointState>,
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

    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_BUDGET, budget_id);

    let render_form_error = |error: &Error| match get_all_categories(user_id, &connection) {
        Ok(categories) => edit_budget_form_view(
            &update_endpoint,
            &categories,
            Some(form.category_id),
            &form.month,
            Some(form.amount),
            &format!("Error: {error}"),
        )
        .into_response(),
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

    match update_budget(
        budget_id,
        user_id,
        form.category_id,
        month,
        form.amount,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ Error::NonPositiveAmount(_)) => render_form_error(&error),
        Err(Error::UpdateMissingBudget) => Error::UpdateMissingBudget.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating budget {budget_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_budget_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    categories: &[Category],
    selected_category: Option<DatabaseId>,
    month: &str,
    amount: Option<Decimal>,
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint).into_html();
    let form = edit_budget_form_view(
        update_endpoint,
        categories,
        selected_category,
        month,
        amount,
        error_message,
    );

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Budget", &[dollar_input_styles()], &content)
}

fn edit_budget_form_view(
    update_endpoint: &str,
    categories: &[Category],
    selected_category: Option<DatabaseId>,
    month: &str,
    amount: Option<Decimal>,
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            h2 class="text-xl font-bold" { "Edit Budget" }

            (budget_form_fields(categories, selected_category, month, amount))

            @if !error_message.is_empty() {
                p
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Budget" }
        }
    }
}

#[cfg(test)]
mod edit_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        auth::PasswordHash,
        budget::db::{create_budget, get_budget},
        category::create_category,
        db::initialize,
        endpoints,
        test_utils::{
            assert_content_type, assert_form_error_message, assert_form_input_with_value,
            assert_form_submit_button_with_text, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document, parse_html_fragment,
        },
        transaction::TransactionKind,
        user::{UserId, create_user},
    };

    use super::{
        BudgetFormData, EditBudgetPageState, UpdateBudgetEndpointState, get_edit_budget_page,
        update_budget_endpoint,
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
    async fn get_edit_budget_page_succeeds() {
        let (db_connection, user_id) = get_test_connection();
        let budget = {
            let connection = db_connection.lock().unwrap();
            let category =
                create_category(&connection, user_id, "Groceries", TransactionKind::Expense)
                    .unwrap();
            create_budget(
                &connection,
                user_id,
                category.id,
                date!(2025 - 06 - 01),
                "400.00".parse().unwrap(),
            )
            .unwrap()
        };
        let state = EditBudgetPageState {
            db_connection: db_connection.clone(),
        };

        let response = get_edit_budget_page(Path(budget.id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(
            &form,
            &endpoints::format_endpoint(endpoints::PUT_BUDGET, budget.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "month", "month", "2025-06");
        assert_form_input_with_value(&form, "amount", "number", "400.00");
        assert_form_submit_button_with_text(&form, "Update Budget");
    }

    #[tokio::test]
    async fn get_edit_budget_page_with_invalid_id_shows_error() {
        let (db_connection, user_id) = get_test_connection();
        let state = EditBudgetPageState { db_connection };
        let invalid_id = 999999;

        let response = get_edit_budget_page(Path(invalid_id), State(state), Extension(user_id))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Budget not found");
    }

    #[tokio::test]
    async fn get_edit_budget_page_hides_other_users_budget() {
        let (db_connection, user_id) = get_test_connection();
        let (budget, other_user_id) = {
            let connection = db_connection.lock().unwrap();
            let other_user = create_user(
                "qux@bar.baz",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap();
            let category =
                create_category(&connection, user_id, "Groceries", TransactionKind::Expense)
                    .unwrap();
            let budget = create_budget(
                &connection,
                user_id,
                category.id,
                date!(2025 - 06 - 01),
                "400.00".parse().unwrap(),
            )
            .unwrap();
            (budget, other_user.id)
        };
        let state = EditBudgetPageState { db_connection };

        let response =
            get_edit_budget_page(Path(budget.id), State(state), Extension(other_user_id))
                .await
                .unwrap();

        let html = parse_html_document(response).await;
        let form = must_get_form(&html);
        assert_form_error_message(&form, "Budget not found");
    }

    #[tokio::test]
    async fn update_budget_endpoint_succeeds() {
        let (db_connection, user_id) = get_test_connection();
        let (budget, category_id) = {
            let connection = db_connection.lock().unwrap();
            let category =
                create_category(&connection, user_id, "Groceries", TransactionKind::Expense)
                    .unwrap();
            let budget = create_budget(
                &connection,
                user_id,
                category.id,
                date!(2025 - 06 - 01),
                "400.00".parse().unwrap(),
            )
            .unwrap();
            (budget, category.id)
        };
        let state = UpdateBudgetEndpointState {
            db_connection: db_connection.clone(),
        };

        let form = BudgetFormData {
            category_id,
            month: "2025-07".to_owned(),
            amount: "450.00".parse().unwrap(),
        };

        let response =
            update_budget_endpoint(Path(budget.id), State(state), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::BUDGETS_VIEW);

        let connection = db_connection.lock().unwrap();
        let updated = get_budget(budget.id, user_id, &connection).unwrap();
        assert_eq!(updated.month, date!(2025 - 07 - 01));
        assert_eq!(updated.amount, "450.00".parse::<Decimal>().unwrap());
    }

    #[tokio::test]
    async fn update_budget_endpoint_with_invalid_id_returns_not_found() {
        let (db_connection, user_id) = get_test_connection();
        let category_id = {
            let connection = db_connection.lock().unwrap();
            create_category(&connection, user_id, "Groceries", TransactionKind::Expense)
                .unwrap()
                .id
        };
        let state = UpdateBudgetEndpointState { db_connection };
        let invalid_id = 999999;
        let form = BudgetFormData {
            category_id,
            month: "2025-06".to_owned(),
            amount: "400.00".parse().unwrap(),
        };

        let response =
            update_budget_endpoint(Path(invalid_id), State(state), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn update_budget_endpoint_with_zero_amount_returns_error() {
        let (db_connection, user_id) = get_test_connection();
        let (budget, category_id) = {
            let connection = db_connection.lock().unwrap();
            let category =
                create_category(&connection, user_id, "Groceries", TransactionKind::Expense)
                    .unwrap();
            let budget = create_budget(
                &connection,
                user_id,
                category.id,
                date!(2025 - 06 - 01),
                "400.00".parse().unwrap(),
            )
            .unwrap();
            (budget, category.id)
        };
        let state = UpdateBudgetEndpointState { db_connection };

        let form = BudgetFormData {
            category_id,
            month: "2025-06".to_owned(),
            amount: Decimal::ZERO,
        };

        let response =
            update_budget_endpoint(Path(budget.id), State(state), Extension(user_id), Form(form))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::OK);

        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_form_error_message(&form, "Error: 0 is not a positive amount");
    }
}
