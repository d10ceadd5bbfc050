//! Live account balances.
//!
//! A balance is never stored: it is always derived as the opening balance
//! plus all income minus all expenses recorded against the account. Amounts
//! are summed in Rust as [Decimal] values so no precision is lost.

use std::collections::HashMap;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::{
    Error,
    account::{Account, get_all_accounts},
    database_id::DatabaseId,
    money::amount_from_row,
    transaction::{TransactionKind, kind_from_row},
    user::UserId,
};

/// An account paired with its derived live balance.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountBalance {
    pub account: Account,
    /// The opening balance plus all income minus all expenses.
    pub live: Decimal,
}

/// Compute the live balance of every account owned by `user_id`, ordered by
/// account name.
pub fn live_balances(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<AccountBalance>, Error> {
    let accounts = get_all_accounts(user_id, connection)?;

    let mut deltas: HashMap<DatabaseId, Decimal> = HashMap::new();
    let rows = connection
        .prepare("SELECT account_id, kind, amount FROM txn WHERE user_id = ?1")?
        .query_map([user_id.as_i64()], |row| {
            let account_id: DatabaseId = row.get(0)?;
            let kind = kind_from_row(row, 1)?;
            let amount = amount_from_row(row, 2)?;

            Ok((account_id, kind, amount))
        })?
        .collect::<Result<Vec<_>, _>>()?;

    for (account_id, kind, amount) in rows {
        let delta = match kind {
            TransactionKind::Income => amount,
            TransactionKind::Expense => -amount,
        };

        *deltas.entry(account_id).or_insert(Decimal::ZERO) += delta;
    }

    Ok(accounts
        .into_iter()
        .map(|account| {
            let delta = deltas.get(&account.id).copied().unwrap_or(Decimal::ZERO);

            AccountBalance {
                live: account.opening_balance + delta,
                account,
            }
        })
        .collect())
}

/// Sum the live balances of all accounts.
pub fn live_balance_total(balances: &[AccountBalance]) -> Decimal {
    balances.iter().map(|balance| balance.live).sum()
}
