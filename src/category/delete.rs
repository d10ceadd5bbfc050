//! Category deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    alert::Alert,
    category::db::delete_category,
    database_id::DatabaseId,
    user::UserId,
};

/// The state needed for deleting a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle category deletion. Returns success alert or error.
pub async fn delete_category_endpoint(
    Path(category_id): Path<DatabaseId>,
    State(state): State<DeleteCategoryEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Category deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::DeleteMissingCategory | Error::CategoryInUse)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting category {category_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
