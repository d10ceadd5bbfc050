//! Account deletion endpoint.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::db::delete_account,
    alert::Alert,
    database_id::DatabaseId,
    user::UserId,
};

/// The state needed for deleting an account.
#[derive(Debug, Clone)]
pub struct DeleteAccountEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteAccountEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle account deletion. Returns success alert or error.
pub async fn delete_account_endpoint(
    Path(account_id): Path<DatabaseId>,
    State(state): State<DeleteAccountEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_account(account_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Account deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error @ (Error::DeleteMissingAccount | Error::AccountInUse)) => {
            error.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting account {account_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}
