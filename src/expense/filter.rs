//! In-memory filtering and sorting of expense records.
//!
//! These functions are pure: they take a snapshot of expense records and
//! produce a derived view without touching the database. A filter dimension
//! that is not set matches every expense, and all set dimensions must match
//! (logical AND).

use std::collections::HashSet;

use time::Date;

use crate::expense::domain::ExpenseRecord;

/// A set of predicates to apply to an expense list.
///
/// The default value matches everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Case-insensitive substring match against the description, category,
    /// payer name and payer email.
    pub search: Option<String>,
    /// Only include expenses whose category is in this set.
    pub categories: Option<HashSet<String>>,
    /// Only include expenses paid by one of these user IDs.
    pub users: Option<HashSet<i64>>,
    /// Only include expenses dated on or after this calendar date.
    pub date_from: Option<Date>,
    /// Only include expenses dated on or before this calendar date.
    pub date_to: Option<Date>,
    /// Only include expenses of at least this amount.
    pub amount_min: Option<f64>,
    /// Only include expenses of at most this amount.
    pub amount_max: Option<f64>,
}

impl ExpenseFilter {
    /// Whether this filter has no active predicates.
    pub fn is_empty(&self) -> bool {
        *self == ExpenseFilter::default()
    }

    /// Whether `record` passes every active predicate.
    pub fn matches(&self, record: &ExpenseRecord) -> bool {
        if let Some(search) = &self.search {
            let term = search.to_lowercase();
            let matches_search = record.description.to_lowercase().contains(&term)
                || record.category.to_lowercase().contains(&term)
                || record.paid_by_name.to_lowercase().contains(&term)
                || record.paid_by_email.to_lowercase().contains(&term);

            if !matches_search {
                return false;
            }
        }

        if let Some(categories) = &self.categories
            && !categories.contains(&record.category)
        {
            return false;
        }

        if let Some(users) = &self.users
            && !users.contains(&record.user_id.as_i64())
        {
            return false;
        }

        if let Some(date_from) = self.date_from
            && record.expense_date < date_from
        {
            return false;
        }

        if let Some(date_to) = self.date_to
            && record.expense_date > date_to
        {
            return false;
        }

        if let Some(amount_min) = self.amount_min
            && record.amount < amount_min
        {
            return false;
        }

        if let Some(amount_max) = self.amount_max
            && record.amount > amount_max
        {
            return false;
        }

        true
    }
}

/// Return the expenses matching every active predicate in `filter`,
/// preserving the input order.
///
/// An empty filter returns the input unchanged.
pub fn filter_expenses(expenses: &[ExpenseRecord], filter: &ExpenseFilter) -> Vec<ExpenseRecord> {
    expenses
        .iter()
        .filter(|record| filter.matches(record))
        .cloned()
        .collect()
}

/// The field to sort expenses by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    /// Sort by the expense amount.
    Amount,
    /// Sort by the calendar date the expense was incurred.
    ExpenseDate,
    /// Sort by when the expense was logged.
    CreatedAt,
}

/// The order to sort expenses in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

/// Sort expenses in place by `key` in the given `order`.
///
/// The sort is stable: expenses with equal keys keep their original
/// relative order.
pub fn sort_expenses(expenses: &mut [ExpenseRecord], key: SortKey, order: SortOrder) {
    expenses.sort_by(|a, b| {
        let ordering = match key {
            SortKey::Amount => a.amount.total_cmp(&b.amount),
            SortKey::ExpenseDate => a.expense_date.cmp(&b.expense_date),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
        };

        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}
