//! Account management: the places money is kept and their derived balances.

mod balance;
mod core;
mod create;
mod db;
mod delete;
mod edit;
mod list;
mod transfer;

pub use balance::{AccountBalance, live_balance_total, live_balances};
pub use core::{Account, create_account_table, map_row_to_account};
pub use create::{AccountFormData, create_account_endpoint, get_new_account_page};
pub use db::{
    account_name_taken, create_account, delete_account, get_account, get_all_accounts,
    update_account,
};
pub use delete::delete_account_endpoint;
pub use edit::{get_edit_account_page, update_account_endpoint};
pub use list::get_accounts_page;
pub use transfer::{TransferFormData, execute_transfer, get_transfer_page, transfer_endpoint};
