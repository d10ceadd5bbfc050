//! Category management for labelling transactions as income or expenses.

mod core;
mod create;
mod db;
mod delete;
mod edit;
mod list;

pub use core::{Category, create_category_table, map_row_to_category};
pub use create::{CategoryFormData, create_category_endpoint, get_new_category_page};
pub use db::{
    TRANSFER_CATEGORY_NAME, category_name_kind_taken, create_category, delete_category,
    get_all_categories, get_category, get_or_create_transfer_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use edit::{get_edit_category_page, update_category_endpoint};
pub use list::get_categories_page;
