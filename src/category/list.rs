//! Displays the user's categories.

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
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links,
    },
    navigation::NavBar,
    transaction::TransactionKind,
    user::UserId,
};

/// The state needed for the [get_categories_page](crate::category::get_categories_page) route handler.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The category data to display in the view
#[derive(Debug, PartialEq)]
struct CategoryTableRow {
    name: String,
    kind: TransactionKind,
    edit_url: String,
    delete_url: String,
}

fn kind_label(kind: TransactionKind) -> &'static str {
    match kind {
        TransactionKind::Income => "Income",
        TransactionKind::Expense => "Expense",
    }
}

fn categories_view(categories: &[CategoryTableRow]) -> Markup {
    let create_category_page_url = endpoints::NEW_CATEGORY_VIEW;
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |category: &CategoryTableRow| {
        let action_links = edit_delete_action_links(
            &category.edit_url,
            &category.delete_url,
            &format!(
                "Are you sure you want to delete the category '{}'? This cannot be undone.",
                category.name
            ),
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    (category.name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (kind_label(category.kind))
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
                    h1 class="text-xl font-bold" { "Categories" }

                    a href=(create_category_page_url) class=(LINK_STYLE)
                    {
                        "Add Category"
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
                                    "Name"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Type"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for category in categories {
                                (table_row(category))
                            }

                            @if categories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories found. Create a category "
                                        a href=(create_category_page_url) class=(LINK_STYLE)
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

    base("Categories", &[], &content)
}

/// Renders the categories page showing all of the user's categories.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_category_rows(user_id, &connection)
        .inspect_err(|error| tracing::error!("could not get all categories: {error}"))?;

    Ok(categories_view(&categories).into_response())
}

fn get_all_category_rows(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<CategoryTableRow>, Error> {
    connection
        .prepare(
            "SELECT id, name, kind FROM category \
            WHERE user_id = ?1 ORDER BY name ASC, kind ASC",
        )?
        .query_map([user_id.as_i64()], |row| {
            let id = row.get(0)?;

            Ok(CategoryTableRow {
                name: row.get(1)?,
                kind: crate::transaction::kind_from_row(row, 2)?,
                edit_url: format_endpoint(endpoints::EDIT_CATEGORY_VIEW, id),
                delete_url: format_endpoint(endpoints::DELETE_CATEGORY, id),
            })
        })?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}
