//! Budgets: monthly spending limits per expense category.

mod core;
mod create;
mod db;
mod delete;
mod edit;
mod list;

pub use core::{Budget, create_budget_table, map_row_to_budget};
pub use create::{BudgetFormData, create_budget_endpoint, get_new_budget_page};
pub use db::{
    BudgetWithCategory, create_budget, delete_budget, first_of_month, get_budget,
    get_budgets_with_category, parse_budget_month, update_budget,
};
pub use delete::delete_budget_endpoint;
pub use edit::{get_edit_budget_page, update_budget_endpoint};
pub use list::get_budgets_page;
