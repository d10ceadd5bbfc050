//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, auth::PasswordHash};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserId(i64);

impl UserId {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The email the user registered with, used to log in.
    pub email: String,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
/// Returns [Error::EmailTaken] if `email` is already registered, or a
/// [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let result = connection.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2)",
        (email, password_hash.as_ref()),
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(sql_error, Some(ref desc)))
            if sql_error.extended_code == 2067 && desc.contains("email") =>
        {
            return Err(Error::EmailTaken(email.to_owned()));
        }
        Err(error) => return Err(error.into()),
    }

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.to_owned(),
        password_hash,
    })
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
/// This function will return an error if:
/// - `email` does not belong to a registered user,
/// - or there was an error trying to access the database.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_row_to_user)
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
/// This function will return an error if:
/// - `user_id` does not belong to a registered user,
/// - or there was an error trying to access the database.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row_to_user)
        .map_err(|error| error.into())
}

fn map_row_to_user(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let raw_id = row.get(0)?;
    let email = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserId::new(raw_id),
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}
