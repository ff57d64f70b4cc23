//! Database operations for expenses.

use rusqlite::{Connection, Row};
use time::OffsetDateTime;

use crate::{
    Error,
    expense::domain::{Expense, ExpenseDraft, ExpenseId, ExpenseRecord},
    group::GroupId,
    user::UserId,
};

/// Initialize the expense table and indexes.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS expense (
            id INTEGER PRIMARY KEY,
            group_id INTEGER,
            user_id INTEGER NOT NULL,
            amount REAL NOT NULL,
            description TEXT NOT NULL,
            category TEXT NOT NULL,
            expense_date TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            is_edited INTEGER NOT NULL DEFAULT 0,
            FOREIGN KEY(group_id) REFERENCES trip_group(id),
            FOREIGN KEY(user_id) REFERENCES user(id)
        );

        CREATE INDEX IF NOT EXISTS idx_expense_group_date ON expense(group_id, expense_date);",
    )?;

    Ok(())
}

/// Insert a validated expense.
///
/// `group_id` is `None` for personal-budget expenses.
pub fn create_expense(
    draft: ExpenseDraft,
    group_id: Option<GroupId>,
    user_id: UserId,
    connection: &Connection,
) -> Result<Expense, Error> {
    let now = OffsetDateTime::now_utc();

    connection.execute(
        "INSERT INTO expense (group_id, user_id, amount, description, category, expense_date,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            group_id,
            user_id.as_i64(),
            draft.amount,
            &draft.description,
            &draft.category,
            draft.expense_date,
            now,
            now,
        ),
    )?;

    let id = connection.last_insert_rowid();

    Ok(Expense {
        id,
        group_id,
        user_id,
        amount: draft.amount,
        description: draft.description,
        category: draft.category,
        expense_date: draft.expense_date,
        created_at: now,
        updated_at: now,
        is_edited: false,
    })
}

/// Apply a validated edit to an existing expense.
///
/// Marks the expense as edited and refreshes its updated timestamp.
///
/// # Errors
///
/// Returns [Error::UpdateMissingExpense] if the expense does not exist.
pub fn update_expense(
    expense_id: ExpenseId,
    draft: ExpenseDraft,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE expense
         SET amount = ?1, description = ?2, category = ?3, expense_date = ?4,
             updated_at = ?5, is_edited = 1
         WHERE id = ?6",
        (
            draft.amount,
            &draft.description,
            &draft.category,
            draft.expense_date,
            OffsetDateTime::now_utc(),
            expense_id,
        ),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    Ok(())
}

/// Delete an expense by ID.
///
/// # Errors
///
/// Returns [Error::DeleteMissingExpense] if the expense does not exist.
pub fn delete_expense(expense_id: ExpenseId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM expense WHERE id = ?1", [expense_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingExpense);
    }

    Ok(())
}

/// Retrieve a single expense by ID.
pub fn get_expense(expense_id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(
            "SELECT id, group_id, user_id, amount, description, category, expense_date,
             created_at, updated_at, is_edited
             FROM expense WHERE id = :id",
        )?
        .query_row(&[(":id", &expense_id)], map_expense_row)
        .map_err(|error| error.into())
}

/// Retrieve a group's expenses joined with the payer's profile, newest
/// expense date first.
///
/// The secondary sort on ID keeps the order stable after edits.
pub fn get_group_expense_records(
    group_id: GroupId,
    connection: &Connection,
) -> Result<Vec<ExpenseRecord>, Error> {
    connection
        .prepare(
            "SELECT expense.id, expense.user_id, user.full_name, user.email, expense.amount,
             expense.description, expense.category, expense.expense_date, expense.created_at,
             expense.is_edited
             FROM expense
             JOIN user ON user.id = expense.user_id
             WHERE expense.group_id = :group_id
             ORDER BY expense.expense_date DESC, expense.id ASC",
        )?
        .query_map(&[(":group_id", &group_id)], map_record_row)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// Retrieve a user's personal-budget expenses, newest expense date first.
pub fn get_personal_expense_records(
    user_id: UserId,
    connection: &Connection,
) -> Result<Vec<ExpenseRecord>, Error> {
    connection
        .prepare(
            "SELECT expense.id, expense.user_id, user.full_name, user.email, expense.amount,
             expense.description, expense.category, expense.expense_date, expense.created_at,
             expense.is_edited
             FROM expense
             JOIN user ON user.id = expense.user_id
             WHERE expense.group_id IS NULL AND expense.user_id = :user_id
             ORDER BY expense.expense_date DESC, expense.id ASC",
        )?
        .query_map(&[(":user_id", &user_id.as_i64())], map_record_row)?
        .map(|maybe_record| maybe_record.map_err(|error| error.into()))
        .collect()
}

/// The sum of a group's expense amounts.
pub fn group_total_spent(group_id: GroupId, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense WHERE group_id = ?1",
            [group_id],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// The sum of a user's personal-budget expense amounts.
pub fn personal_total_spent(user_id: UserId, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM expense
             WHERE group_id IS NULL AND user_id = ?1",
            [user_id.as_i64()],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        group_id: row.get(1)?,
        user_id: UserId::new(row.get(2)?),
        amount: row.get(3)?,
        description: row.get(4)?,
        category: row.get(5)?,
        expense_date: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        is_edited: row.get(9)?,
    })
}

fn map_record_row(row: &Row) -> Result<ExpenseRecord, rusqlite::Error> {
    Ok(ExpenseRecord {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        paid_by_name: row.get(2)?,
        paid_by_email: row.get(3)?,
        amount: row.get(4)?,
        description: row.get(5)?,
        category: row.get(6)?,
        expense_date: row.get(7)?,
        created_at: row.get(8)?,
        is_edited: row.get(9)?,
    })
}
