//! The account type and its table.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;

use crate::{database_id::DatabaseId, money::amount_from_row, user::UserId};

/// A place money is kept, e.g. a bank account or a wallet of cash.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The ID of the account.
    pub id: DatabaseId,
    /// The user that owns the account.
    pub user_id: UserId,
    /// The display name of the account.
    pub name: String,
    /// The balance of the account before any recorded transactions.
    pub opening_balance: Decimal,
}

/// Create the account table.
///
/// The UNIQUE constraint backstops the duplicate-name check done before
/// inserts and updates: two requests racing past the check cannot both
/// commit the same name for one user.
pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            opening_balance TEXT NOT NULL,
            UNIQUE(user_id, name)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    let name = row.get(2)?;
    let opening_balance = amount_from_row(row, 3)?;

    Ok(Account {
        id,
        user_id: UserId::new(user_id),
        name,
        opening_balance,
    })
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}
