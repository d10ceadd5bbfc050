//! Category creation page and endpoint.

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
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::create_category,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_RADIO_GROUP_STYLE,
        FORM_RADIO_INPUT_STYLE, FORM_RADIO_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    transaction::TransactionKind,
    user::UserId,
};

/// The state needed for creating a category.
#[derive(Debug, Clone)]
pub struct CreateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating or updating a category.
#[derive(Debug, Deserialize)]
pub struct CategoryFormData {
    /// The category name.
    pub name: String,
    /// Whether the category is for income or expenses.
    pub kind: TransactionKind,
}

/// Render the category creation page.
pub async fn get_new_category_page() -> Response {
    new_category_view().into_response()
}

/// Handle category creation form submission.
pub async fn create_category_endpoint(
    State(state): State<CreateCategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<CategoryFormData>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_category(&connection, user_id, &form.name, form.kind) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::EmptyCategoryName | Error::DuplicateCategoryName(_))) => {
            new_category_form_view(&form.name, form.kind, &format!("Error: {error}"))
                .into_response()
        }
        Err(error) => {
            tracing::error!("An unexpected error occurred while creating a category: {error}");

            error.into_alert_response()
        }
    }
}

fn new_category_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_CATEGORY_VIEW).into_html();
    let form = new_category_form_view("", TransactionKind::Expense, "");

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Create Category", &[], &content)
}

pub(super) fn kind_radio_group(selected: TransactionKind) -> Markup {
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

fn new_category_form_view(name: &str, kind: TransactionKind, error_message: &str) -> Markup {
    let create_category_endpoint = endpoints::POST_CATEGORY;

    html! {
        form
            hx-post=(create_category_endpoint)
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            div
            {
                label
                    for="name"
                    class=(FORM_LABEL_STYLE)
                {
                    "Category Name"
                }

                input
                    id="name"
                    type="text"
                    name="name"
                    placeholder="Category Name"
                    value=(name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            (kind_radio_group(kind))

            @if !error_message.is_empty() {
                p class="text-red-600 dark:text-red-400"
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Create Category" }
        }
    }
}
