//! The budget type and its table.

use rusqlite::{Connection, Row};
use rust_decimal::Decimal;
use time::Date;

use crate::{database_id::DatabaseId, money::amount_from_row, user::UserId};

/// A monthly spending limit for one expense category.
#[derive(Debug, Clone, PartialEq)]
pub struct Budget {
    /// The ID of the budget.
    pub id: DatabaseId,
    /// The user that owns the budget.
    pub user_id: UserId,
    /// The category the budget limits.
    pub category_id: DatabaseId,
    /// The month the budget applies to, normalized to the first of the month.
    pub month: Date,
    /// The spending limit, always positive.
    pub amount: Decimal,
}

/// Create the budget table.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            month TEXT NOT NULL,
            amount TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_budget(row: &Row) -> Result<Budget, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    let category_id = row.get(2)?;
    let month = row.get(3)?;
    let amount = amount_from_row(row, 4)?;

    Ok(Budget {
        id,
        user_id: UserId::new(user_id),
        category_id,
        month,
        amount,
    })
}
