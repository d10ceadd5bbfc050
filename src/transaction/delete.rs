//! Transaction deletion endpoint.

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
    database_id::DatabaseId,
    transaction::db::delete_transaction,
    user::UserId,
};

/// The state needed for deleting a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Handle transaction deletion. Returns success alert or error.
pub async fn delete_transaction_endpoint(
    Path(transaction_id): Path<DatabaseId>,
    State(state): State<DeleteTransactionEndpointState>,
    Extension(user_id): Extension<UserId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(transaction_id, user_id, &connection) {
        Ok(_) => Alert::SuccessSimple {
            message: "Transaction deleted successfully".to_owned(),
        }
        .into_response(),
        Err(Error::DeleteMissingTransaction) => {
            Error::DeleteMissingTransaction.into_alert_response()
        }
        Err(error) => {
            tracing::error!(
                "An unexpected error occurred while deleting transaction {transaction_id}: {error}"
            );
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
        http::StatusCode,
        response::IntoResponse,
    };
    use rusqlite::Connection;
    use rust_decimal::Decimal;
    use time::macros::date;

    use crate::{
        account::create_account,
        auth::PasswordHash,
        category::create_category,
        db::initialize,
        transaction::{
            TransactionKind,
            db::{TransactionData, create_transaction, get_transaction},
        },
        user::{UserId, create_user},
    };

    use super::{DeleteTransactionEndpointState, delete_transaction_endpoint};

    fn get_test_state() -> (DeleteTransactionEndpointState, UserId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "foo@bar.baz",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (
            DeleteTransactionEndpointState {
                db_connection: Arc::new(Mutex::new(connection)),
            },
            user.id,
        )
    }

    fn create_test_transaction(
        state: &DeleteTransactionEndpointState,
        user_id: UserId,
    ) -> crate::transaction::Transaction {
        let connection = state.db_connection.lock().unwrap();
        let account = create_account(&connection, user_id, "Checking", Decimal::ZERO).unwrap();
        let category =
            create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();

        create_transaction(
            &connection,
            user_id,
            TransactionData {
                account_id: account.id,
                category_id: category.id,
                kind: TransactionKind::Expense,
                amount: "12.34".parse().unwrap(),
                date: date!(2025 - 06 - 15),
                note: String::new(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn delete_transaction_endpoint_succeeds() {
        let (state, user_id) = get_test_state();
        let transaction = create_test_transaction(&state, user_id);

        let response = delete_transaction_endpoint(
            Path(transaction.id),
            State(state.clone()),
            Extension(user_id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_transaction(transaction.id, user_id, &connection).is_err());
    }

    #[tokio::test]
    async fn delete_transaction_endpoint_with_invalid_id_returns_not_found() {
        let (state, user_id) = get_test_state();
        let invalid_id = 999999;

        let response =
            delete_transaction_endpoint(Path(invalid_id), State(state), Extension(user_id))
                .await
                .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_transaction_endpoint_ignores_other_users_transaction() {
        let (state, user_id) = get_test_state();
        let transaction = create_test_transaction(&state, user_id);
        let other_user_id = {
            let connection = state.db_connection.lock().unwrap();
            create_user(
                "qux@bar.baz",
                PasswordHash::new_unchecked("hunter2"),
                &connection,
            )
            .unwrap()
            .id
        };

        let response = delete_transaction_endpoint(
            Path(transaction.id),
            State(state.clone()),
            Extension(other_user_id),
        )
        .await
        .into_response();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let connection = state.db_connection.lock().unwrap();
        assert!(get_transaction(transaction.id, user_id, &connection).is_ok());
    }
}
