//! Database operations and storage types for saved expense filters.

use std::collections::HashSet;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, expense::ExpenseFilter, group::GroupId, user::UserId};

/// Alias for the integer type used for saved filter IDs in the database.
pub type SavedFilterId = i64;

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The predicate set of a saved filter, stored as a JSON column.
///
/// Dates are kept as `YYYY-MM-DD` strings so the stored JSON matches what
/// the date inputs submit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedFilterConfig {
    /// The selected category names.
    #[serde(default)]
    pub categories: Vec<String>,
    /// The selected member user IDs.
    #[serde(default)]
    pub users: Vec<i64>,
    /// The start of the date range, inclusive.
    #[serde(default)]
    pub date_from: Option<String>,
    /// The end of the date range, inclusive.
    #[serde(default)]
    pub date_to: Option<String>,
    /// The minimum amount, inclusive.
    #[serde(default)]
    pub amount_min: Option<f64>,
    /// The maximum amount, inclusive.
    #[serde(default)]
    pub amount_max: Option<f64>,
}

impl SavedFilterConfig {
    /// Convert the stored config into the in-memory predicate set.
    ///
    /// Unparsable dates are dropped rather than failing the whole filter:
    /// the rest of the saved predicates still apply.
    pub fn to_filter(&self) -> ExpenseFilter {
        let parse_date = |raw: &Option<String>| {
            raw.as_deref()
                .and_then(|text| Date::parse(text, DATE_FORMAT).ok())
        };

        ExpenseFilter {
            search: None,
            categories: if self.categories.is_empty() {
                None
            } else {
                Some(self.categories.iter().cloned().collect::<HashSet<_>>())
            },
            users: if self.users.is_empty() {
                None
            } else {
                Some(self.users.iter().copied().collect::<HashSet<_>>())
            },
            date_from: parse_date(&self.date_from),
            date_to: parse_date(&self.date_to),
            amount_min: self.amount_min,
            amount_max: self.amount_max,
        }
    }
}

/// A saved filter row.
#[derive(Clone, Debug, PartialEq)]
pub struct SavedFilter {
    /// The filter's ID in the application database.
    pub id: SavedFilterId,
    /// The user that saved the filter.
    pub user_id: UserId,
    /// The group the filter applies to.
    pub group_id: GroupId,
    /// The name the user gave the filter. Unique per user.
    pub name: String,
    /// The stored predicate set.
    pub config: SavedFilterConfig,
}

/// Initialize the saved filter table.
pub fn create_saved_filter_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS saved_filter (
            id INTEGER PRIMARY KEY,
            user_id INTEGER NOT NULL,
            group_id INTEGER NOT NULL,
            name TEXT NOT NULL,
            config TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(user_id, name),
            FOREIGN KEY(user_id) REFERENCES user(id),
            FOREIGN KEY(group_id) REFERENCES trip_group(id)
        )",
        (),
    )?;

    Ok(())
}

/// Save a named filter for a user and group.
///
/// # Errors
///
/// Returns [Error::DuplicateFilterName] if the user already has a filter
/// with this name.
pub fn save_filter(
    user_id: UserId,
    group_id: GroupId,
    name: &str,
    config: &SavedFilterConfig,
    connection: &Connection,
) -> Result<SavedFilter, Error> {
    let serialized = serde_json::to_string(config)
        .map_err(|error| Error::JsonSerializationError(error.to_string()))?;

    connection
        .execute(
            "INSERT INTO saved_filter (user_id, group_id, name, config) VALUES (?1, ?2, ?3, ?4)",
            (user_id.as_i64(), group_id, name, &serialized),
        )
        .map_err(|error| match error {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("saved_filter") =>
            {
                Error::DuplicateFilterName(name.to_string())
            }
            error => error.into(),
        })?;

    Ok(SavedFilter {
        id: connection.last_insert_rowid(),
        user_id,
        group_id,
        name: name.to_string(),
        config: config.clone(),
    })
}

/// Retrieve a user's saved filters for a group, newest first.
pub fn get_user_filters(
    user_id: UserId,
    group_id: GroupId,
    connection: &Connection,
) -> Result<Vec<SavedFilter>, Error> {
    connection
        .prepare(
            "SELECT id, user_id, group_id, name, config FROM saved_filter
             WHERE user_id = :user_id AND group_id = :group_id
             ORDER BY created_at DESC, id DESC",
        )?
        .query_map(
            &[(":user_id", &user_id.as_i64()), (":group_id", &group_id)],
            map_row,
        )?
        .map(|maybe_filter| maybe_filter.map_err(|error| error.into()))
        .collect()
}

/// Retrieve one of the user's saved filters by ID.
///
/// The user scope means one user can never apply another user's filter.
pub fn get_filter(
    filter_id: SavedFilterId,
    user_id: UserId,
    connection: &Connection,
) -> Result<SavedFilter, Error> {
    connection
        .prepare(
            "SELECT id, user_id, group_id, name, config FROM saved_filter
             WHERE id = :id AND user_id = :user_id",
        )?
        .query_row(&[(":id", &filter_id), (":user_id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Delete one of the user's saved filters.
///
/// # Errors
///
/// Returns [Error::DeleteMissingFilter] if the filter does not exist or
/// belongs to another user.
pub fn delete_filter(
    filter_id: SavedFilterId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "DELETE FROM saved_filter WHERE id = ?1 AND user_id = ?2",
        (filter_id, user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingFilter);
    }

    Ok(())
}

fn map_row(row: &Row) -> Result<SavedFilter, rusqlite::Error> {
    let raw_config: String = row.get(4)?;
    // The column is written via serde_json, so a parse failure means outside
    // tampering. Fall back to a filter that matches everything.
    let config = serde_json::from_str(&raw_config).unwrap_or_default();

    Ok(SavedFilter {
        id: row.get(0)?,
        user_id: UserId::new(row.get(1)?),
        group_id: row.get(2)?,
        name: row.get(3)?,
        config,
    })
}
