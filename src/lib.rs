//! Tripledger is a web app for tracking shared trip budgets.
//!
//! Users create expense-splitting groups, invite travel companions with a
//! short code, log expenses against the group budget, and export the trip
//! log as a self-contained HTML report or a CSV file.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::response::{IntoResponse, Response};
use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod budget;
mod config;
mod custom_filter;
mod dashboard;
mod db;
mod endpoints;
mod expense;
mod group;
mod html;
mod internal_server_error;
mod logging;
mod navigation;
mod not_found;
mod password;
mod report;
mod routing;
mod stats;
mod timezone;
mod user;

pub use app_state::AppState;
pub use config::RoleConfig;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use password::{PasswordHash, ValidatedPassword};
pub use routing::build_router;
pub use user::{Role, User, UserId, get_user_by_email, get_user_by_id};

use crate::{
    internal_server_error::{InternalServerError, render_internal_server_error},
    not_found::get_404_not_found_response,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid email and password combination.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Either the user ID or expiry cookie is missing from the cookie jar in
    /// the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email used to register an account already belongs to an account.
    #[error("the email address is already registered")]
    DuplicateEmail,

    /// An empty string was used for a trip name.
    #[error("trip name cannot be empty")]
    EmptyTripName,

    /// A trip name was longer than the allowed number of characters.
    #[error("trip name cannot be longer than {0} characters")]
    TripNameTooLong(usize),

    /// A budget amount was zero, negative or not a number.
    #[error("budget must be a positive amount")]
    InvalidBudget,

    /// An expense amount was zero, negative or not a number.
    #[error("expense amount must be a positive amount")]
    InvalidAmount,

    /// An empty string was used for an expense description.
    #[error("description cannot be empty")]
    EmptyDescription,

    /// An expense description was longer than the allowed number of characters.
    #[error("description cannot be longer than {0} characters")]
    DescriptionTooLong(usize),

    /// An empty string was used for an expense category.
    #[error("category cannot be empty")]
    EmptyCategory,

    /// An invite code had the wrong length or characters outside A-Z and 0-9.
    #[error("invite codes are 8 letters and digits")]
    InvalidInviteCode,

    /// No group matched the given invite code or group ID.
    #[error("group not found")]
    GroupNotFound,

    /// The group exists but has been deactivated.
    #[error("this group is no longer active")]
    GroupInactive,

    /// The user tried to join a group they already belong to.
    #[error("you are already a member of this group")]
    AlreadyMember,

    /// A freshly generated invite code clashed with an existing group's code.
    #[error("the generated invite code is already in use")]
    DuplicateInviteCode,

    /// The user is not a member of the group they tried to access.
    #[error("you are not a member of this group")]
    NotGroupMember,

    /// A group-admin-only action was attempted by a regular member.
    #[error("only the group admin can do this")]
    NotGroupAdmin,

    /// The user's account role does not grant the attempted action.
    #[error("your account role does not allow this action")]
    PermissionDenied,

    /// An expense would push spending past the remaining budget.
    ///
    /// Carries the remaining budget so the client can show how much room
    /// is left.
    #[error("expense exceeds the remaining budget (${0:.2} left)")]
    OverBudget(f64),

    /// A personal budget was already set and may not be set again.
    #[error("a budget has already been set and cannot be changed")]
    BudgetAlreadySet,

    /// A saved filter name is already in use by the same user.
    #[error("a saved filter named \"{0}\" already exists")]
    DuplicateFilterName(String),

    /// Tried to update an expense that does not exist.
    #[error("tried to update an expense that is not in the database")]
    UpdateMissingExpense,

    /// Tried to delete an expense that does not exist.
    #[error("tried to delete an expense that is not in the database")]
    DeleteMissingExpense,

    /// Tried to delete a saved filter that does not exist.
    #[error("tried to delete a saved filter that is not in the database")]
    DeleteMissingFilter,

    /// The role configuration file could not be parsed or failed validation.
    #[error("invalid role configuration: {0}")]
    InvalidRoleConfig(String),

    /// A value could not be serialized as JSON for storage.
    #[error("could not serialize as JSON: {0}")]
    JsonSerializationError(String),

    /// A CSV export could not be written.
    #[error("could not write CSV: {0}")]
    CsvError(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("user.email") =>
            {
                Error::DuplicateEmail
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("trip_group.invite_code") =>
            {
                Error::DuplicateInviteCode
            }
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.contains("membership") =>
            {
                Error::AlreadyMember
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            // Membership failures render as 404 rather than revealing that
            // the group exists.
            Error::NotFound | Error::GroupNotFound | Error::NotGroupMember => {
                get_404_not_found_response()
            }
            Error::NotGroupAdmin | Error::PermissionDenied => {
                let page = html::error_view(
                    "Forbidden",
                    "403",
                    "You don't have permission to do that.",
                    "Ask the group admin, or check your account role.",
                );
                (axum::http::StatusCode::FORBIDDEN, page).into_response()
            }
            Error::InvalidTimezoneError(timezone) => {
                render_internal_server_error(InternalServerError {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                    ),
                })
            }
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}
