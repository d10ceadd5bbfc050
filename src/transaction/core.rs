//! The transaction type, its income/expense kind, and the `txn` table.

use rusqlite::{
    Connection, Row,
    types::{FromSqlError, Type},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{database_id::DatabaseId, money::amount_from_row, user::UserId};

/// Whether a transaction adds money to an account or takes money out of it.
///
/// Amounts are always positive, the direction of a transaction is recorded
/// here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming into an account.
    Income,
    /// Money going out of an account.
    Expense,
}

impl TransactionKind {
    /// The string stored in the database for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

/// Read a transaction kind from the TEXT column at `index` of `row`.
pub fn kind_from_row(row: &Row, index: usize) -> Result<TransactionKind, rusqlite::Error> {
    let text: String = row.get(index)?;

    match text.as_str() {
        "income" => Ok(TransactionKind::Income),
        "expense" => Ok(TransactionKind::Expense),
        other => Err(rusqlite::Error::FromSqlConversionFailure(
            index,
            Type::Text,
            Box::new(FromSqlError::Other(
                format!("invalid transaction kind {other:?}").into(),
            )),
        )),
    }
}

/// A single entry in a user's ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: DatabaseId,
    /// The user that owns the transaction.
    pub user_id: UserId,
    /// The account the money went into or came out of.
    pub account_id: DatabaseId,
    /// The category the transaction is filed under.
    pub category_id: DatabaseId,
    /// Whether this is income or an expense.
    pub kind: TransactionKind,
    /// The amount of money, always positive.
    pub amount: Decimal,
    /// When the transaction happened.
    pub date: Date,
    /// A free-text note.
    pub note: String,
}

/// Create the transaction table.
///
/// The table is named `txn` because "transaction" is a SQL keyword.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS txn (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            account_id INTEGER NOT NULL,
            category_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            amount TEXT NOT NULL,
            date TEXT NOT NULL,
            note TEXT NOT NULL DEFAULT ''
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_transaction(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let user_id: i64 = row.get(1)?;
    let account_id = row.get(2)?;
    let category_id = row.get(3)?;
    let kind = kind_from_row(row, 4)?;
    let amount = amount_from_row(row, 5)?;
    let date = row.get(6)?;
    let note = row.get(7)?;

    Ok(Transaction {
        id,
        user_id: UserId::new(user_id),
        account_id,
        category_id,
        kind,
        amount,
        date,
        note,
    })
}


#[cfg(test)]
mod transaction_kind_tests {
    use super::TransactionKind;

    #[test]
    fn round_trips_through_form_encoding() {
        let income: TransactionKind = serde_html_form::from_str("kind=income")
            .map(|form: std::collections::HashMap<String, TransactionKind>| form["kind"])
            .unwrap();
        let expense: TransactionKind = serde_html_form::from_str("kind=expense")
            .map(|form: std::collections::HashMap<String, TransactionKind>| form["kind"])
            .unwrap();

        assert_eq!(income, TransactionKind::Income);
        assert_eq!(expense, TransactionKind::Expense);
    }

    #[test]
    fn as_str_matches_stored_values() {
        assert_eq!(TransactionKind::Income.as_str(), "income");
        assert_eq!(TransactionKind::Expense.as_str(), "expense");
    }
}
