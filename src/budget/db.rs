//! Queries for creating, fetching, updating and deleting budgets.

use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use time::{Date, macros::format_description};

use crate::{
    Error,
    budget::core::{Budget, map_row_to_budget},
    database_id::DatabaseId,
    money::{to_sql_string, validate_amount},
    user::UserId,
};

/// Parse a month string from an HTML month input, e.g. "2025-06", into the
/// first day of that month.
///
/// # Errors
/// Returns [Error::InvalidDateFormat] if `month` is not a valid "YYYY-MM"
/// string.
pub fn parse_budget_month(month: &str) -> Result<Date, Error> {
    let date_format = format_description!("[year]-[month]-[day]");

    Date::parse(&format!("{month}-01"), date_format)
        // Some user agents submit a full date for the month input.
        .or_else(|_| Date::parse(month, date_format))
        .map(first_of_month)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), month.to_owned()))
}

/// Normalize a date to the first day of its month.
pub fn first_of_month(date: Date) -> Date {
    // The first of the month is always a valid date.
    date.replace_day(1).unwrap_or(date)
}

/// Create and insert a new budget for `user_id`.
///
/// The month is normalized to the first day of the month and the amount to
/// two fraction digits.
///
/// # Errors
/// Returns [Error::NonPositiveAmount] if `amount` is zero or negative, or
/// [Error::InvalidCategory] if `category_id` does not refer to a category
/// owned by the user.
pub fn create_budget(
    connection: &Connection,
    user_id: UserId,
    category_id: DatabaseId,
    month: Date,
    amount: Decimal,
) -> Result<Budget, Error> {
    let amount = validate_amount(amount)?;
    ensure_category_owned(category_id, user_id, connection)?;
    let month = first_of_month(month);

    connection.execute(
        "INSERT INTO budget (user_id, category_id, month, amount) VALUES (?1, ?2, ?3, ?4)",
        params![user_id.as_i64(), category_id, month, to_sql_string(amount)],
    )?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        user_id,
        category_id,
        month,
        amount,
    })
}

/// Retrieve the budget with `id` that belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a budget owned by the
/// user.
pub fn get_budget(id: DatabaseId, user_id: UserId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare(
            "SELECT id, user_id, category_id, month, amount FROM budget \
            WHERE id = ?1 AND user_id = ?2",
        )?
        .query_one(params![id, user_id.as_i64()], map_row_to_budget)
        .map_err(Error::from)
}

/// A budget joined with the name of its category for display.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetWithCategory {
    pub budget: Budget,
    pub category_name: String,
}

/// Get all of the user's budgets with their category names, newest month
/// first then by category name.
pub fn get_budgets_with_category(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<BudgetWithCategory>, Error> {
    connection
        .prepare(
            "SELECT b.id, b.user_id, b.category_id, b.month, b.amount, c.name \
            FROM budget b \
            JOIN category c ON c.id = b.category_id \
            WHERE b.user_id = ?1 \
            ORDER BY b.month DESC, c.name ASC",
        )?
        .query_map(params![user_id.as_i64()], |row| {
            Ok(BudgetWithCategory {
                budget: map_row_to_budget(row)?,
                category_name: row.get(5)?,
            })
        })?
        .map(|budget_result| budget_result.map_err(Error::from))
        .collect()
}

type RowsAffected = usize;

/// Update the category, month and amount of the budget with `id`.
///
/// # Errors
/// Returns the same validation errors as [create_budget], or
/// [Error::UpdateMissingBudget] if `id` does not refer to a budget owned by
/// the user.
pub fn update_budget(
    id: DatabaseId,
    user_id: UserId,
    category_id: DatabaseId,
    month: Date,
    amount: Decimal,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let amount = validate_amount(amount)?;
    ensure_category_owned(category_id, user_id, connection)?;
    let month = first_of_month(month);

    let rows_affected = connection.execute(
        "UPDATE budget SET category_id = ?1, month = ?2, amount = ?3 \
        WHERE id = ?4 AND user_id = ?5",
        params![category_id, month, to_sql_string(amount), id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBudget);
    }

    Ok(rows_affected)
}

/// Delete the budget with `id`.
///
/// # Errors
/// Returns [Error::DeleteMissingBudget] if `id` does not refer to a budget
/// owned by the user.
pub fn delete_budget(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let rows_affected = connection.execute(
        "DELETE FROM budget WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(rows_affected)
}

fn ensure_category_owned(
    category_id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let exists: bool = connection.query_one(
        "SELECT EXISTS (SELECT 1 FROM category WHERE id = ?1 AND user_id = ?2)",
        params![category_id, user_id.as_i64()],
        |row| row.get(0),
    )?;

    if exists {
        Ok(())
    } else {
        Err(Error::InvalidCategory(Some(category_id)))
    }
}
