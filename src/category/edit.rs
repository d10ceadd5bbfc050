//! Category editing page and endpoint.

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

use crate::{
    AppState, Error,
    category::{CategoryFormData, create::kind_radio_group, get_category, update_category},
    database_id::DatabaseId,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
    transaction::TransactionKind,
    user::UserId,
};

/// The state needed for the edit category page.
#[derive(Debug, Clone)]
pub struct EditCategoryPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditCategoryPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The state needed for updating a category.
#[derive(Debug, Clone)]
pub struct UpdateCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for UpdateCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the category editing page.
pub async fn get_edit_category_page(
    Path(category_id): Path<DatabaseId>,
    State(state): State<EditCategoryPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let edit_endpoint = endpoints::format_endpoint(endpoints::EDIT_CATEGORY_VIEW, category_id);
    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    match get_category(category_id, user_id, &connection) {
        Ok(category) => Ok(edit_category_view(
            &edit_endpoint,
            &update_endpoint,
            &category.name,
            category.kind,
            "",
        )
        .into_response()),
        Err(error) => {
            let error_message = match error {
                Error::NotFound => "Category not found",
                _ => {
                    tracing::error!("Failed to retrieve category {category_id}: {error}");
                    "Failed to load category"
                }
            };

            Ok(edit_category_view(
                &edit_endpoint,
                &update_endpoint,
                "",
                TransactionKind::Expense,
                error_message,
            )
            .into_response())
        }
    }
}

/// Handle category update form submission.
pub async fn update_category_endpoint(
    Path(category_id): Path<DatabaseId>,
    State(state): State<UpdateCategoryEndpointState>,
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

    let update_endpoint = endpoints::format_endpoint(endpoints::PUT_CATEGORY, category_id);

    match update_category(category_id, user_id, &form.name, form.kind, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::CATEGORIES_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error @ (Error::EmptyCategoryName | Error::DuplicateCategoryName(_))) => {
            edit_category_form_view(
                &update_endpoint,
                &form.name,
                form.kind,
                &format!("Error: {error}"),
            )
            .into_response()
        }
        Err(Error::UpdateMissingCategory) => Error::UpdateMissingCategory.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while updating category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

fn edit_category_view(
    edit_endpoint: &str,
    update_endpoint: &str,
    name: &str,
    kind: TransactionKind,
    error_message: &str,
) -> Markup {
    let nav_bar = NavBar::new(edit_endpoint).into_html();
    let form = edit_category_form_view(update_endpoint, name, kind, error_message);

    let content = html! {
        (nav_bar)
        div class=(FORM_CONTAINER_STYLE) { (form) }
    };

    base("Edit Category", &[], &content)
}

fn edit_category_form_view(
    update_endpoint: &str,
    name: &str,
    kind: TransactionKind,
    error_message: &str,
) -> Markup {
    html! {
        form
            hx-put=(update_endpoint)
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
                p
                {
                    (error_message)
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Update Category" }
        }
    }
}
