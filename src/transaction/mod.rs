//! Transaction management: the ledger entries that drive balances, the
//! dashboard and budgets.

mod core;
mod create;
mod db;
mod delete;
mod edit;
mod list;

pub use core::{
    Transaction, TransactionKind, create_transaction_table, kind_from_row, map_row_to_transaction,
};
pub use create::{TransactionFormData, create_transaction_endpoint, get_new_transaction_page};
pub use db::{
    TransactionData, create_transaction, delete_transaction, get_all_transactions,
    get_transaction, update_transaction,
};
pub use delete::delete_transaction_endpoint;
pub use edit::{get_edit_transaction_page, update_transaction_endpoint};
pub use list::get_transactions_page;
