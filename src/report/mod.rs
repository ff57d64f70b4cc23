//! The trip log: a self-contained report of a group's spending, exportable
//! as a standalone HTML document or a CSV file.
//!
//! Building the report loads everything it needs up front; rendering is
//! pure string building, so an exported document never needs another
//! network request — or any network at all — to display.

mod csv;
mod endpoints;
mod html;

pub use csv::{csv_filename, expenses_csv, sanitize_trip_name, trip_log_filename};
pub use endpoints::{ReportState, download_expenses_csv, download_trip_log};
pub use html::render_trip_log_html;

use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    expense::{ExpenseRecord, SortKey, SortOrder, get_group_expense_records, sort_expenses},
    group::{Group, GroupId, Member, get_group, get_members},
    stats::{CategoryTotal, MemberSpending, by_category, by_user, remaining, total_of},
};

/// The aggregate figures included in a trip log.
#[derive(Clone, Debug, PartialEq)]
pub struct TripLogStats {
    /// The group's budget ceiling.
    pub total_budget: f64,
    /// The sum of all expenses.
    pub total_spent: f64,
    /// Budget minus spending. Negative when over budget.
    pub remaining: f64,
    /// How many members the group has.
    pub member_count: usize,
    /// How many expenses were logged.
    pub expense_count: usize,
    /// Spending per category, largest first.
    pub category_breakdown: Vec<CategoryTotal>,
    /// Spending per member, largest first.
    pub member_spending: Vec<MemberSpending>,
}

/// Everything needed to render a trip log, loaded in one go.
#[derive(Clone, Debug, PartialEq)]
pub struct TripLog {
    /// The group the report describes.
    pub group: Group,
    /// The group's members.
    pub members: Vec<Member>,
    /// The full expense ledger in chronological order.
    ///
    /// Reports tell the story of the trip from start to finish, so this is
    /// ascending by date even though the interactive pages default to
    /// newest first.
    pub expenses: Vec<ExpenseRecord>,
    /// The aggregate figures.
    pub stats: TripLogStats,
    /// The date the report was generated, in the server's local timezone.
    pub generated_on: Date,
}

/// Load a group's data and compute the trip log.
///
/// Fails with [Error::GroupNotFound] if the group is missing; a report is
/// never produced with silently-missing sections.
pub fn build_trip_log(
    group_id: GroupId,
    generated_on: Date,
    connection: &Connection,
) -> Result<TripLog, Error> {
    let group = get_group(group_id, connection)?;
    let members = get_members(group_id, connection)?;

    let mut expenses = get_group_expense_records(group_id, connection)?;
    sort_expenses(&mut expenses, SortKey::ExpenseDate, SortOrder::Ascending);

    let total_spent = total_of(&expenses);
    let stats = TripLogStats {
        total_budget: group.total_budget,
        total_spent,
        remaining: remaining(group.total_budget, &expenses),
        member_count: members.len(),
        expense_count: expenses.len(),
        category_breakdown: by_category(&expenses, group.total_budget),
        member_spending: by_user(&expenses),
    };

    Ok(TripLog {
        group,
        members,
        expenses,
        stats,
        generated_on,
    })
}
