//! The category type and its table.

use rusqlite::{Connection, Row};

use crate::{
    database_id::DatabaseId,
    transaction::{TransactionKind, kind_from_row},
    user::UserId,
};

/// A label for grouping transactions, e.g. "Groceries" or "Salary".
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    /// The ID of the category.
    pub id: DatabaseId,
    /// The user that owns the category.
    pub user_id: UserId,
    /// The display name of the category.
    pub name: String,
    /// Whether the category is for income or expense transactions.
    pub kind: TransactionKind,
}

/// Create the category table.
///
/// The UNIQUE constraint backstops the duplicate-name check done before
/// inserts and updates: two requests racing past the check cannot both
/// commit the same (name, kind) for one user.
pub fn create_category_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS category (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            UNIQUE(user_id, name, kind)
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_category(row: &Row) -> Result<Category, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    let name = row.get(2)?;
    let kind = kind_from_row(row, 3)?;

    Ok(Category {
        id,
        user_id: UserId::new(user_id),
        name,
        kind,
    })
}
