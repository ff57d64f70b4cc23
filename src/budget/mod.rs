//! The personal budget: a single ceiling per user, tracked outside any
//! group. Unlike a group budget it is set exactly once, and expenses that
//! would overrun what is left are rejected.

mod db;
mod endpoints;
mod page;

pub use db::{create_personal_budget_table, get_personal_budget, set_personal_budget};
pub use endpoints::{create_personal_expense_endpoint, set_personal_budget_endpoint};
pub use page::get_personal_budget_page;

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the personal budget page and endpoints.
#[derive(Clone)]
pub struct BudgetState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
