//! Database functions for creating, querying, updating and deleting
//! transactions.

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    database_id::DatabaseId,
    money::{to_sql_string, validate_amount},
    transaction::{Transaction, TransactionKind, map_row_to_transaction},
    user::UserId,
};

type RowsAffected = usize;

/// The fields the client supplies when creating or updating a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionData {
    pub account_id: DatabaseId,
    pub category_id: DatabaseId,
    pub kind: TransactionKind,
    pub amount: Decimal,
    pub date: Date,
    pub note: String,
}

/// Create a transaction in the database for the user `user_id`.
///
/// The amount is normalized to two fraction digits. The account and category
/// must exist and belong to the same user.
///
/// # Errors
/// Returns:
/// - [Error::NonPositiveAmount] if the amount is zero or negative,
/// - [Error::InvalidAccount] if the account does not belong to the user,
/// - [Error::InvalidCategory] if the category does not belong to the user,
/// - [Error::SqlError] if there is an unexpected SQL error.
pub fn create_transaction(
    connection: &Connection,
    user_id: UserId,
    data: TransactionData,
) -> Result<Transaction, Error> {
    let amount = validate_amount(data.amount)?;
    ensure_account_owned(data.account_id, user_id, connection)?;
    ensure_category_owned(data.category_id, user_id, connection)?;

    connection.execute(
        "INSERT INTO txn (user_id, account_id, category_id, kind, amount, date, note) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        (
            user_id.as_i64(),
            data.account_id,
            data.category_id,
            data.kind.as_str(),
            to_sql_string(amount),
            data.date,
            &data.note,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Transaction {
        id,
        user_id,
        account_id: data.account_id,
        category_id: data.category_id,
        kind: data.kind,
        amount,
        date: data.date,
        note: data.note,
    })
}

/// Retrieve the transaction `id` owned by `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if there is no such transaction for this user.
pub fn get_transaction(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Transaction, Error> {
    connection
        .query_one(
            "SELECT id, user_id, account_id, category_id, kind, amount, date, note \
            FROM txn WHERE id = ?1 AND user_id = ?2",
            (id, user_id.as_i64()),
            map_row_to_transaction,
        )
        .map_err(Error::from)
}

/// Retrieve all of the user's transactions, newest first.
pub fn get_all_transactions(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, account_id, category_id, kind, amount, date, note \
            FROM txn WHERE user_id = ?1 ORDER BY date DESC, id DESC",
        )?
        .query_map([user_id.as_i64()], map_row_to_transaction)?
        .map(|transaction_result| transaction_result.map_err(Error::from))
        .collect()
}

/// Update the transaction `id` owned by `user_id` with the fields in `data`.
///
/// # Errors
/// Returns the same validation errors as [create_transaction], or
/// [Error::UpdateMissingTransaction] if the transaction does not exist for
/// this user.
pub fn update_transaction(
    id: DatabaseId,
    user_id: UserId,
    data: TransactionData,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let amount = validate_amount(data.amount)?;
    ensure_account_owned(data.account_id, user_id, connection)?;
    ensure_category_owned(data.category_id, user_id, connection)?;

    let rows_affected = connection.execute(
        "UPDATE txn SET account_id = ?1, category_id = ?2, kind = ?3, amount = ?4, \
        date = ?5, note = ?6 WHERE id = ?7 AND user_id = ?8",
        (
            data.account_id,
            data.category_id,
            data.kind.as_str(),
            to_sql_string(amount),
            data.date,
            &data.note,
            id,
            user_id.as_i64(),
        ),
    )?;

    if rows_affected == 0 {
        Err(Error::UpdateMissingTransaction)
    } else {
        Ok(rows_affected)
    }
}

/// Delete the transaction `id` owned by `user_id`.
///
/// # Errors
/// Returns [Error::DeleteMissingTransaction] if the transaction does not
/// exist for this user.
pub fn delete_transaction(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM txn WHERE id = ?1 AND user_id = ?2",
        (id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        Err(Error::DeleteMissingTransaction)
    } else {
        Ok(rows_affected)
    }
}

fn ensure_account_owned(
    account_id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let exists: bool = connection.query_one(
        "SELECT EXISTS (SELECT 1 FROM account WHERE id = ?1 AND user_id = ?2)",
        (account_id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if exists {
        Ok(())
    } else {
        Err(Error::InvalidAccount(Some(account_id)))
    }
}

fn ensure_category_owned(
    category_id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let exists: bool = connection.query_one(
        "SELECT EXISTS (SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2)",
        (category_id, user_id.as_i64()),
        |row| row.get(0),
    )?;

    if exists {
        Ok(())
    } else {
        Err(Error::InvalidCategory(Some(category_id)))
    }
}
