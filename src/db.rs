//! Database initialization for the application.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    Error, account::create_account_table, budget::create_budget_table,
    category::create_category_table, transaction::create_transaction_table,
    user::create_user_table,
};

/// Create the application tables if they do not already exist.
///
/// The tables are created within a single exclusive transaction so that two
/// processes racing to initialize the same database file cannot observe a
/// half-created schema.
///
/// # Errors
/// Returns an [Error::SqlError] if the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_budget_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use super::initialize;

    #[test]
    fn creates_all_tables() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        initialize(&connection).expect("Could not initialize database");

        let mut statement = connection
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let table_names: Vec<String> = statement
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        for want in ["account", "budget", "category", "txn", "user"] {
            assert!(
                table_names.iter().any(|name| name == want),
                "want table {want}, got {table_names:?}"
            );
        }
    }

    #[test]
    fn is_idempotent() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        initialize(&connection).expect("Could not initialize database");

        assert_eq!(Ok(()), initialize(&connection));
    }
}
