//! Database operations for the personal budget.

use rusqlite::Connection;

use crate::{Error, user::UserId};

/// Create the personal budget table.
///
/// One row per user; the primary key doubles as the storage-level backstop
/// for the set-once rule enforced in [set_personal_budget].
pub fn create_personal_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS personal_budget (
                user_id INTEGER PRIMARY KEY,
                amount REAL NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY(user_id) REFERENCES user(id)
                )",
        (),
    )?;

    Ok(())
}

/// The user's personal budget ceiling, or `None` if they have not set one.
pub fn get_personal_budget(
    user_id: UserId,
    connection: &Connection,
) -> Result<Option<f64>, Error> {
    let mut statement =
        connection.prepare("SELECT amount FROM personal_budget WHERE user_id = :user_id")?;

    let mut rows = statement.query(&[(":user_id", &user_id.as_i64())])?;

    match rows.next()? {
        Some(row) => Ok(Some(row.get(0)?)),
        None => Ok(None),
    }
}

/// Store the user's personal budget.
///
/// A personal budget is set once and is thereafter immutable.
///
/// # Errors
///
/// Returns [Error::BudgetAlreadySet] if the user already has a budget; the
/// stored value is left unchanged.
pub fn set_personal_budget(
    user_id: UserId,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    if get_personal_budget(user_id, connection)?.is_some() {
        return Err(Error::BudgetAlreadySet);
    }

    connection.execute(
        "INSERT INTO personal_budget (user_id, amount) VALUES (?1, ?2)",
        (user_id.as_i64(), amount),
    )?;

    Ok(())
}
