//! Queries for creating, fetching, updating and deleting accounts.

use rusqlite::{Connection, params};
use rust_decimal::Decimal;

use crate::{
    Error,
    account::core::{Account, map_row_to_account},
    database_id::DatabaseId,
    money::{FRACTION_DIGITS, to_sql_string},
    user::UserId,
};

/// Create and insert a new account for `user_id`.
///
/// The opening balance may be zero or negative (an overdrawn account), so it
/// is only normalized to two fraction digits, not validated like transaction
/// amounts.
///
/// # Errors
/// Returns [Error::EmptyAccountName] if `name` is blank, or
/// [Error::DuplicateAccountName] if the user already has an account with this
/// name.
pub fn create_account(
    connection: &Connection,
    user_id: UserId,
    name: &str,
    opening_balance: Decimal,
) -> Result<Account, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    let opening_balance = opening_balance.round_dp(FRACTION_DIGITS);

    connection
        .execute(
            "INSERT INTO account (user_id, name, opening_balance) VALUES (?1, ?2, ?3)",
            params![user_id.as_i64(), name, to_sql_string(opening_balance)],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 2067 =>
            {
                Error::DuplicateAccountName(name.to_owned())
            }
            error => error.into(),
        })?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        user_id,
        name: name.to_owned(),
        opening_balance,
    })
}

/// Retrieve the account with `id` that belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to an account owned by
/// the user.
pub fn get_account(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, opening_balance FROM account \
            WHERE id = ?1 AND user_id = ?2",
        )?
        .query_one(params![id, user_id.as_i64()], map_row_to_account)
        .map_err(Error::from)
}

/// Get all of the user's accounts, ordered by name.
pub fn get_all_accounts(user_id: UserId, connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, opening_balance FROM account \
            WHERE user_id = ?1 ORDER BY name ASC",
        )?
        .query_map(params![user_id.as_i64()], map_row_to_account)?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}

/// Check whether the user already has an account with this name.
///
/// `exclude_id` skips one account so that saving an edit without renaming
/// does not conflict with itself.
pub fn account_name_taken(
    user_id: UserId,
    name: &str,
    exclude_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<bool, Error> {
    let count: i64 = connection.query_one(
        "SELECT COUNT(id) FROM account WHERE user_id = ?1 AND name = ?2 AND id != ?3",
        params![user_id.as_i64(), name, exclude_id.unwrap_or(-1)],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

type RowsAffected = usize;

/// Update the name and opening balance of the account with `id`.
///
/// # Errors
/// Returns [Error::EmptyAccountName] for a blank name,
/// [Error::DuplicateAccountName] if another of the user's accounts already
/// uses the name, or [Error::UpdateMissingAccount] if `id` does not refer to
/// an account owned by the user.
pub fn update_account(
    id: DatabaseId,
    user_id: UserId,
    name: &str,
    opening_balance: Decimal,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyAccountName);
    }

    if account_name_taken(user_id, name, Some(id), connection)? {
        return Err(Error::DuplicateAccountName(name.to_owned()));
    }

    let opening_balance = opening_balance.round_dp(FRACTION_DIGITS);

    let rows_affected = connection
        .execute(
            "UPDATE account SET name = ?1, opening_balance = ?2 WHERE id = ?3 AND user_id = ?4",
            params![name, to_sql_string(opening_balance), id, user_id.as_i64()],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 2067 =>
            {
                Error::DuplicateAccountName(name.to_owned())
            }
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingAccount);
    }

    Ok(rows_affected)
}

/// Delete the account with `id` if no transactions reference it.
///
/// # Errors
/// Returns [Error::AccountInUse] if any of the user's transactions use the
/// account, or [Error::DeleteMissingAccount] if `id` does not refer to an
/// account owned by the user.
pub fn delete_account(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let transaction_count: i64 = connection.query_one(
        "SELECT COUNT(id) FROM txn WHERE account_id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
        |row| row.get(0),
    )?;

    if transaction_count > 0 {
        return Err(Error::AccountInUse);
    }

    let rows_affected = connection.execute(
        "DELETE FROM account WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingAccount);
    }

    Ok(rows_affected)
}
