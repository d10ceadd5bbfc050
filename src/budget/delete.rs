//! Budget deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error, alert::Alert, budget::db::delete_budget, database_id::DatabaseId,
    user::UserId,
};

/// The state needed for deleting a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle budget deletion. Returns success alert or error.
pub async fn delete_budget_endpoint(
    Path(budget_id): Path<DatabaseId>,
    State(state): State<DeleteBudgetEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(budget_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Budget deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ Error::DeleteMissingBudget) => error.into_alert_response(),
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting budget {budget_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
