//! Queries for creating, fetching, updating and deleting categories.

use rusqlite::{Connection, params};

use crate::{
    Error,
    category::core::{Category, map_row_to_category},
    database_id::DatabaseId,
    transaction::TransactionKind,
    user::UserId,
};

/// The name of the categories created on demand for account transfers.
pub const TRANSFER_CATEGORY_NAME: &str = "Transfer";

/// Create and insert a new category for `user_id`.
///
/// # Errors
/// Returns [Error::EmptyCategoryName] if `name` is blank, or
/// [Error::DuplicateCategoryName] if the user already has a category with
/// this name and kind.
pub fn create_category(
    connection: &Connection,
    user_id: UserId,
    name: &str,
    kind: TransactionKind,
) -> Result<Category, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyCategoryName);
    }

    connection
        .execute(
            "INSERT INTO category (user_id, name, kind) VALUES (?1, ?2, ?3)",
            params![user_id.as_i64(), name, kind.as_str()],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 2067 =>
            {
                Error::DuplicateCategoryName(name.to_owned())
            }
            error => error.into(),
        })?;

    Ok(Category {
        id: connection.last_insert_rowid(),
        user_id,
        name: name.to_owned(),
        kind,
    })
}

/// Retrieve the category with `id` that belongs to `user_id`.
///
/// # Errors
/// Returns [Error::NotFound] if `id` does not refer to a category owned by
/// the user.
pub fn get_category(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<Category, Error> {
    connection
        .prepare("SELECT id, user_id, name, kind FROM category WHERE id = ?1 AND user_id = ?2")?
        .query_one(params![id, user_id.as_i64()], map_row_to_category)
        .map_err(Error::from)
}

/// Get all of the user's categories, ordered by name then kind.
pub fn get_all_categories(user_id: UserId, connection: &Connection) -> Result<Vec<Category>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, name, kind FROM category \
            WHERE user_id = ?1 ORDER BY name ASC, kind ASC",
        )?
        .query_map(params![user_id.as_i64()], map_row_to_category)?
        .map(|category_result| category_result.map_err(Error::from))
        .collect()
}

/// Check whether the user already has a category with this name and kind.
///
/// `exclude_id` skips one category so that saving an edit without renaming
/// does not conflict with itself.
pub fn category_name_kind_taken(
    user_id: UserId,
    name: &str,
    kind: TransactionKind,
    exclude_id: Option<DatabaseId>,
    connection: &Connection,
) -> Result<bool, Error> {
    let count: i64 = connection.query_one(
        "SELECT COUNT(id) FROM category \
        WHERE user_id = ?1 AND name = ?2 AND kind = ?3 AND id != ?4",
        params![user_id.as_i64(), name, kind.as_str(), exclude_id.unwrap_or(-1)],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

type RowsAffected = usize;

/// Update the name and kind of the category with `id`.
///
/// # Errors
/// Returns [Error::EmptyCategoryName] for a blank name,
/// [Error::DuplicateCategoryName] if another of the user's categories
/// already uses the name and kind, or [Error::UpdateMissingCategory] if `id`
/// does not refer to a category owned by the user.
pub fn update_category(
    id: DatabaseId,
    user_id: UserId,
    name: &str,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::EmptyCategoryName);
    }

    if category_name_kind_taken(user_id, name, kind, Some(id), connection)? {
        return Err(Error::DuplicateCategoryName(name.to_owned()));
    }

    let rows_affected = connection
        .execute(
            "UPDATE category SET name = ?1, kind = ?2 WHERE id = ?3 AND user_id = ?4",
            params![name, kind.as_str(), id, user_id.as_i64()],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(sql_error, Some(_))
                if sql_error.extended_code == 2067 =>
            {
                Error::DuplicateCategoryName(name.to_owned())
            }
            error => error.into(),
        })?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingCategory);
    }

    Ok(rows_affected)
}

/// Delete the category with `id` if no transactions reference it.
///
/// # Errors
/// Returns [Error::CategoryInUse] if any of the user's transactions use the
/// category, or [Error::DeleteMissingCategory] if `id` does not refer to a
/// category owned by the user.
pub fn delete_category(
    id: DatabaseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    let transaction_count: i64 = connection.query_one(
        "SELECT COUNT(id) FROM txn WHERE category_id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
        |row| row.get(0),
    )?;

    if transaction_count > 0 {
        return Err(Error::CategoryInUse);
    }

    let rows_affected = connection.execute(
        "DELETE FROM category WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.as_i64()],
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingCategory);
    }

    Ok(rows_affected)
}

/// Get the user's "Transfer" category of the given kind, creating it if it
/// does not exist yet.
///
/// Transfers between accounts are recorded as a paired expense and income,
/// each filed under the matching Transfer category.
pub fn get_or_create_transfer_category(
    user_id: UserId,
    kind: TransactionKind,
    connection: &Connection,
) -> Result<Category, Error> {
    let existing = connection
        .prepare(
            "SELECT id, user_id, name, kind FROM category \
            WHERE user_id = ?1 AND name = ?2 AND kind = ?3",
        )?
        .query_one(
            params![user_id.as_i64(), TRANSFER_CATEGORY_NAME, kind.as_str()],
            map_row_to_category,
        );

    match existing {
        Ok(category) => Ok(category),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            create_category(connection, user_id, TRANSFER_CATEGORY_NAME, kind)
        }
        Err(error) => Err(error.into()),
    }
}

#[cfg(test)]
mod category_db_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        auth::PasswordHash,
        db::initialize,
        transaction::TransactionKind,
        user::{UserId, create_user},
    };

    use super::{
        TRANSFER_CATEGORY_NAME, create_category, delete_category, get_all_categories,
        get_category, get_or_create_transfer_category, update_category,
    };

    fn get_test_connection() -> (Connection, UserId) {
        let connection =
            Connection::open_in_memory().expect("Could not open in-memory SQLite database");
        initialize(&connection).expect("Could not initialize database");
        let user = create_user(
            "foo@bar.baz",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user");

        (connection, user.id)
    }

    #[test]
    fn creates_and_gets_category() {
        let (connection, user_id) = get_test_connection();

        let category =
            create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();

        assert_eq!(
            get_category(category.id, user_id, &connection),
            Ok(category)
        );
    }

    #[test]
    fn create_rejects_empty_name() {
        let (connection, user_id) = get_test_connection();

        let result = create_category(&connection, user_id, "   ", TransactionKind::Expense);

        assert_eq!(result, Err(Error::EmptyCategoryName));
    }

    #[test]
    fn create_rejects_duplicate_name_and_kind() {
        let (connection, user_id) = get_test_connection();
        create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();

        let result = create_category(&connection, user_id, "Groceries", TransactionKind::Expense);

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Groceries".to_owned()))
        );
    }

    #[test]
    fn same_name_with_different_kind_is_allowed() {
        let (connection, user_id) = get_test_connection();
        create_category(&connection, user_id, "Rebates", TransactionKind::Expense).unwrap();

        let result = create_category(&connection, user_id, "Rebates", TransactionKind::Income);

        assert!(result.is_ok());
    }

    #[test]
    fn same_name_for_different_user_is_allowed() {
        let (connection, user_id) = get_test_connection();
        let other_user = create_user(
            "qux@bar.baz",
            crate::auth::PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();

        let result = create_category(
            &connection,
            other_user.id,
            "Groceries",
            TransactionKind::Expense,
        );

        assert!(result.is_ok());
    }

    #[test]
    fn get_category_does_not_return_other_users_category() {
        let (connection, user_id) = get_test_connection();
        let other_user = create_user(
            "qux@bar.baz",
            crate::auth::PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();
        let category =
            create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();

        let result = get_category(category.id, other_user.id, &connection);

        assert_eq!(result, Err(Error::NotFound));
    }

    #[test]
    fn lists_categories_ordered_by_name() {
        let (connection, user_id) = get_test_connection();
        create_category(&connection, user_id, "Zoo", TransactionKind::Expense).unwrap();
        create_category(&connection, user_id, "Apples", TransactionKind::Expense).unwrap();

        let names: Vec<String> = get_all_categories(user_id, &connection)
            .unwrap()
            .into_iter()
            .map(|category| category.name)
            .collect();

        assert_eq!(names, vec!["Apples".to_owned(), "Zoo".to_owned()]);
    }

    #[test]
    fn update_allows_saving_without_renaming() {
        let (connection, user_id) = get_test_connection();
        let category =
            create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();

        let result = update_category(
            category.id,
            user_id,
            "Groceries",
            TransactionKind::Expense,
            &connection,
        );

        assert_eq!(result, Ok(1));
    }

    #[test]
    fn update_rejects_renaming_to_existing_category() {
        let (connection, user_id) = get_test_connection();
        create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();
        let category =
            create_category(&connection, user_id, "Dining", TransactionKind::Expense).unwrap();

        let result = update_category(
            category.id,
            user_id,
            "Groceries",
            TransactionKind::Expense,
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::DuplicateCategoryName("Groceries".to_owned()))
        );
    }

    #[test]
    fn update_missing_category_fails() {
        let (connection, user_id) = get_test_connection();

        let result = update_category(
            999,
            user_id,
            "Groceries",
            TransactionKind::Expense,
            &connection,
        );

        assert_eq!(result, Err(Error::UpdateMissingCategory));
    }

    #[test]
    fn delete_removes_category() {
        let (connection, user_id) = get_test_connection();
        let category =
            create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();

        let result = delete_category(category.id, user_id, &connection);

        assert_eq!(result, Ok(1));
        assert_eq!(
            get_category(category.id, user_id, &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_refuses_category_used_by_transactions() {
        let (connection, user_id) = get_test_connection();
        let category =
            create_category(&connection, user_id, "Groceries", TransactionKind::Expense).unwrap();
        connection
            .execute(
                "INSERT INTO txn (user_id, account_id, category_id, kind, amount, date, note) \
                VALUES (?1, 1, ?2, 'expense', '10.00', '2024-05-01', '')",
                (user_id.as_i64(), category.id),
            )
            .unwrap();

        let result = delete_category(category.id, user_id, &connection);

        assert_eq!(result, Err(Error::CategoryInUse));
        assert!(get_category(category.id, user_id, &connection).is_ok());
    }

    #[test]
    fn delete_missing_category_fails() {
        let (connection, user_id) = get_test_connection();

        let result = delete_category(999, user_id, &connection);

        assert_eq!(result, Err(Error::DeleteMissingCategory));
    }

    #[test]
    fn transfer_category_is_created_once() {
        let (connection, user_id) = get_test_connection();

        let first =
            get_or_create_transfer_category(user_id, TransactionKind::Expense, &connection)
                .unwrap();
        let second =
            get_or_create_transfer_category(user_id, TransactionKind::Expense, &connection)
                .unwrap();

        assert_eq!(first, second);
        assert_eq!(first.name, TRANSFER_CATEGORY_NAME);
        assert_eq!(first.kind, TransactionKind::Expense);
    }
}
