//! Code for creating the user table, fetching users, and the account role
//! capability table.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, PasswordHash};

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

/// The access level of an account.
///
/// Roles are assigned from the role configuration at registration time and
/// gate what an account may do through the explicit capability table in
/// [Role::capabilities]. They are an access-level tag, not an auth
/// mechanism: group-scoped rights (e.g. deleting a group) additionally
/// require the group admin membership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Full access, including destructive actions.
    Admin,
    /// The default role: may log and edit expenses and export reports.
    User,
    /// Read-only access.
    Viewer,
}

/// What an account [Role] is allowed to do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    /// May create and edit expenses, groups and budgets.
    pub can_edit: bool,
    /// May download trip-log and CSV exports.
    pub can_export: bool,
    /// May delete groups and other users' expenses.
    pub can_delete: bool,
}

impl Role {
    /// The capability table for this role.
    pub fn capabilities(&self) -> Capabilities {
        match self {
            Role::Admin => Capabilities {
                can_edit: true,
                can_export: true,
                can_delete: true,
            },
            Role::User => Capabilities {
                can_edit: true,
                can_export: true,
                can_delete: false,
            },
            Role::Viewer => Capabilities {
                can_edit: false,
                can_export: false,
                can_delete: false,
            },
        }
    }

    /// The role name as stored in the database and the role configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::User => "User",
            Role::Viewer => "Viewer",
        }
    }

    /// Parse a role name, e.g. from the database or the role configuration.
    pub fn parse(name: &str) -> Result<Self, Error> {
        match name {
            "Admin" => Ok(Role::Admin),
            "User" => Ok(Role::User),
            "Viewer" => Ok(Role::Viewer),
            other => Err(Error::InvalidRoleConfig(format!(
                "unknown role \"{other}\", expected one of Admin, User, Viewer"
            ))),
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The email address the user signs in with. Unique.
    pub email: String,
    /// The name shown to other group members.
    pub full_name: String,
    /// The account's access level.
    pub role: Role,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                full_name TEXT NOT NULL,
                role TEXT NOT NULL,
                password TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
                )",
        (),
    )?;

    Ok(())
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns [Error::DuplicateEmail] if the email already belongs to an
/// account, or [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    email: &str,
    full_name: &str,
    role: Role,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    connection.execute(
        "INSERT INTO user (email, full_name, role, password) VALUES (?1, ?2, ?3, ?4)",
        (email, full_name, role.as_str(), password_hash.as_ref()),
    )?;

    let id = UserId::new(connection.last_insert_rowid());

    Ok(User {
        id,
        email: email.to_owned(),
        full_name: full_name.to_owned(),
        role,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, full_name, role, password FROM user WHERE id = :id")?
        .query_row(&[(":id", &user_id.as_i64())], map_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an email equal to `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, full_name, role, password FROM user WHERE email = :email")?
        .query_row(&[(":email", &email)], map_row)
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_role: String = row.get(3)?;
    // Roles are written via Role::as_str, so an unknown value means the row
    // was tampered with. Fall back to the most restrictive role.
    let role = Role::parse(&raw_role).unwrap_or(Role::Viewer);
    let raw_password_hash: String = row.get(4)?;

    Ok(User {
        id: UserId::new(row.get(0)?),
        email: row.get(1)?,
        full_name: row.get(2)?,
        role,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

#[cfg(test)]
mod role_tests {
    use super::Role;

    #[test]
    fn parse_round_trips_all_roles() {
        for role in [Role::Admin, Role::User, Role::Viewer] {
            assert_eq!(Role::parse(role.as_str()), Ok(role));
        }
    }

    #[test]
    fn parse_fails_on_unknown_role() {
        assert!(Role::parse("Superuser").is_err());
    }

    #[test]
    fn viewer_has_no_capabilities() {
        let capabilities = Role::Viewer.capabilities();

        assert!(!capabilities.can_edit);
        assert!(!capabilities.can_export);
        assert!(!capabilities.can_delete);
    }

    #[test]
    fn only_admin_can_delete() {
        assert!(Role::Admin.capabilities().can_delete);
        assert!(!Role::User.capabilities().can_delete);
        assert!(!Role::Viewer.capabilities().can_delete);
    }
}
