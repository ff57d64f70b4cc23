//! Expenses: the dated spend records logged against a group budget or the
//! personal budget, plus the in-memory filtering and sorting used by the
//! expense pages and reports.

mod create;
mod db;
mod domain;
mod edit;
mod filter;
mod list;

pub use create::{create_expense_endpoint, get_new_expense_page};
pub use db::{
    create_expense, create_expense_table, delete_expense, get_expense,
    get_group_expense_records, get_personal_expense_records, group_total_spent,
    personal_total_spent, update_expense,
};
pub use domain::{Expense, ExpenseDraft, ExpenseId, ExpenseRecord, MAX_DESCRIPTION_LENGTH};
pub use edit::{delete_expense_endpoint, get_edit_expense_page, update_expense_endpoint};
pub use filter::{ExpenseFilter, SortKey, SortOrder, filter_expenses, sort_expenses};
pub use list::{ExpensesQuery, get_group_expenses_page};

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the expense pages and endpoints.
#[derive(Clone)]
pub struct ExpenseState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}
