//! The expense types and the validation applied before an expense is stored.

use time::{Date, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, group::GroupId, user::UserId};

/// Alias for the integer type used for expense IDs in the database.
pub type ExpenseId = i64;

/// The maximum expense description length in grapheme clusters.
pub const MAX_DESCRIPTION_LENGTH: usize = 80;

/// A validated expense waiting to be inserted or applied as an update.
///
/// Validation happens once here; the aggregation functions downstream assume
/// well-formed input and do not re-validate.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseDraft {
    /// How much was spent. Always positive and finite.
    pub amount: f64,
    /// What the money was spent on. Never empty, at most 80 characters.
    pub description: String,
    /// The expense category. Never empty.
    pub category: String,
    /// The calendar date the expense was incurred. Future dates are allowed
    /// since trips are often paid for in advance.
    pub expense_date: Date,
}

impl ExpenseDraft {
    /// Validate the raw form values for an expense.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::InvalidAmount] if `amount` is zero, negative or not finite,
    /// - [Error::EmptyDescription] if `description` is empty or whitespace,
    /// - [Error::DescriptionTooLong] if `description` is longer than 80 characters,
    /// - [Error::EmptyCategory] if `category` is empty or whitespace.
    pub fn new(
        amount: f64,
        description: &str,
        category: &str,
        expense_date: Date,
    ) -> Result<Self, Error> {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(Error::InvalidAmount);
        }

        let description = description.trim();
        if description.is_empty() {
            return Err(Error::EmptyDescription);
        }
        if description.graphemes(true).count() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::DescriptionTooLong(MAX_DESCRIPTION_LENGTH));
        }

        let category = category.trim();
        if category.is_empty() {
            return Err(Error::EmptyCategory);
        }

        Ok(Self {
            amount,
            description: description.to_string(),
            category: category.to_string(),
            expense_date,
        })
    }
}

/// A stored expense.
#[derive(Clone, Debug, PartialEq)]
pub struct Expense {
    /// The expense's ID in the application database.
    pub id: ExpenseId,
    /// The group this expense belongs to, or `None` for a personal-budget
    /// expense.
    pub group_id: Option<GroupId>,
    /// The user that paid.
    pub user_id: UserId,
    /// How much was spent.
    pub amount: f64,
    /// What the money was spent on.
    pub description: String,
    /// The expense category.
    pub category: String,
    /// The calendar date the expense was incurred.
    pub expense_date: Date,
    /// When the expense row was created.
    pub created_at: OffsetDateTime,
    /// When the expense row was last changed.
    pub updated_at: OffsetDateTime,
    /// Set once the expense has been edited after creation.
    pub is_edited: bool,
}

/// An expense joined with its owner's profile fields.
///
/// This is the shape the pages, aggregation functions and reports work
/// with, mirroring what a member sees: who paid, not just which user ID.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpenseRecord {
    /// The expense's ID in the application database.
    pub id: ExpenseId,
    /// The user that paid.
    pub user_id: UserId,
    /// The display name of the user that paid.
    pub paid_by_name: String,
    /// The email of the user that paid.
    pub paid_by_email: String,
    /// How much was spent.
    pub amount: f64,
    /// What the money was spent on.
    pub description: String,
    /// The expense category.
    pub category: String,
    /// The calendar date the expense was incurred.
    pub expense_date: Date,
    /// When the expense row was created.
    pub created_at: OffsetDateTime,
    /// Set once the expense has been edited after creation.
    pub is_edited: bool,
}
