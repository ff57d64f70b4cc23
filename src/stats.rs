//! Pure aggregation over expense snapshots: totals, remaining budget,
//! progress, and the per-category and per-member breakdowns.
//!
//! These functions never touch the database and never validate: callers
//! hand them well-formed records and they only compute. Derived views are
//! recomputed from scratch on every page render, which is cheap at the
//! expense counts a trip produces.

use std::collections::HashMap;

use crate::{expense::ExpenseRecord, user::UserId};

/// The sum of the expense amounts. Zero for an empty slice.
pub fn total_of(expenses: &[ExpenseRecord]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// How much of `budget` is left after the given expenses.
///
/// May be negative when the group is over budget; callers decide how to
/// present that.
pub fn remaining(budget: f64, expenses: &[ExpenseRecord]) -> f64 {
    budget - total_of(expenses)
}

/// How far through the budget spending is, as a percentage capped at 100.
///
/// Returns 0 when `budget` is not positive, so a group with no budget never
/// divides by zero.
pub fn budget_progress(budget: f64, expenses: &[ExpenseRecord]) -> f64 {
    if budget <= 0.0 {
        return 0.0;
    }

    (total_of(expenses) / budget * 100.0).min(100.0)
}

/// What share of `reference_budget` an amount represents, as a percentage.
///
/// Returns 0 when the reference budget is not positive.
pub fn percent_of_budget(amount: f64, reference_budget: f64) -> f64 {
    if reference_budget <= 0.0 {
        return 0.0;
    }

    amount / reference_budget * 100.0
}

/// One row of the per-category breakdown.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryTotal {
    /// The category name.
    pub category: String,
    /// The summed amount spent in this category.
    pub total: f64,
    /// The category total as a percentage of the reference budget.
    pub percent_of_budget: f64,
}

/// Sum expenses per category, largest total first.
///
/// The result is sparse: categories without expenses do not appear. Ties are
/// broken alphabetically so the output is deterministic.
pub fn by_category(expenses: &[ExpenseRecord], reference_budget: f64) -> Vec<CategoryTotal> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category.as_str()).or_insert(0.0) += expense.amount;
    }

    let mut breakdown: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_string(),
            total,
            percent_of_budget: percent_of_budget(total, reference_budget),
        })
        .collect();

    breakdown.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
    });

    breakdown
}

/// One row of the per-member breakdown.
#[derive(Clone, Debug, PartialEq)]
pub struct MemberSpending {
    /// The member's user ID.
    pub user_id: UserId,
    /// The member's display name.
    pub name: String,
    /// The member's email address.
    pub email: String,
    /// The summed amount this member paid.
    pub total: f64,
    /// How many expenses this member logged.
    pub count: usize,
}

/// Accumulate spending per member in a single pass, largest total first.
///
/// Members without expenses do not appear. Ties are broken by name so the
/// output is deterministic.
pub fn by_user(expenses: &[ExpenseRecord]) -> Vec<MemberSpending> {
    let mut spending: HashMap<UserId, MemberSpending> = HashMap::new();

    for expense in expenses {
        let entry = spending
            .entry(expense.user_id)
            .or_insert_with(|| MemberSpending {
                user_id: expense.user_id,
                name: expense.paid_by_name.clone(),
                email: expense.paid_by_email.clone(),
                total: 0.0,
                count: 0,
            });

        entry.total += expense.amount;
        entry.count += 1;
    }

    let mut breakdown: Vec<MemberSpending> = spending.into_values().collect();

    breakdown.sort_by(|a, b| {
        b.total
            .total_cmp(&a.total)
            .then_with(|| a.name.cmp(&b.name))
    });

    breakdown
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use crate::{expense::ExpenseRecord, user::UserId};

    use super::{
        budget_progress, by_category, by_user, percent_of_budget, remaining, total_of,
    };

    fn record(user_id: i64, name: &str, amount: f64, category: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: 0,
            user_id: UserId::new(user_id),
            paid_by_name: name.to_string(),
            paid_by_email: format!("{}@example.com", name.to_lowercase()),
            amount,
            description: format!("{category} expense"),
            category: category.to_string(),
            expense_date: date!(2026 - 03 - 01),
            created_at: datetime!(2026-03-01 12:00 UTC),
            is_edited: false,
        }
    }

    /// The worked scenario from the budget cards: a $1000.00 trip with a cafe
    /// lunch and a taxi ride.
    fn cafe_and_taxi() -> Vec<ExpenseRecord> {
        vec![
            record(1, "Ana", 45.5, "Food"),
            record(2, "Ben", 22.0, "Transport"),
        ]
    }

    #[test]
    fn total_of_empty_is_zero() {
        assert_eq!(total_of(&[]), 0.0);
    }

    #[test]
    fn total_is_order_independent() {
        let mut expenses = cafe_and_taxi();
        let forward = total_of(&expenses);

        expenses.reverse();
        let backward = total_of(&expenses);

        assert_eq!(forward, backward);
        assert_eq!(forward, 67.5);
    }

    #[test]
    fn remaining_is_budget_minus_total() {
        let expenses = cafe_and_taxi();

        assert_eq!(remaining(1000.0, &expenses), 932.5);
    }

    #[test]
    fn remaining_goes_negative_when_over_budget() {
        let expenses = cafe_and_taxi();

        assert_eq!(remaining(50.0, &expenses), -17.5);
    }

    /// Test helper macro to compare floats that have been through a division,
    /// where the last bit may differ from the hand-computed value.
    macro_rules! assert_close {
        ($left:expr, $right:expr) => {
            assert!(
                ($left - $right).abs() < 1e-9,
                "got {}, want {}",
                $left,
                $right
            );
        };
    }

    #[test]
    fn budget_progress_for_scenario() {
        let expenses = cafe_and_taxi();

        assert_close!(budget_progress(1000.0, &expenses), 6.75);
    }

    #[test]
    fn budget_progress_is_capped_at_100() {
        let expenses = cafe_and_taxi();

        assert_eq!(budget_progress(50.0, &expenses), 100.0);
    }

    #[test]
    fn budget_progress_with_zero_budget_is_zero() {
        let expenses = cafe_and_taxi();

        assert_eq!(budget_progress(0.0, &expenses), 0.0);
        assert_eq!(budget_progress(-10.0, &expenses), 0.0);
    }

    #[test]
    fn percent_of_zero_budget_is_zero() {
        assert_eq!(percent_of_budget(45.5, 0.0), 0.0);
    }

    #[test]
    fn by_category_matches_scenario() {
        let expenses = cafe_and_taxi();

        let breakdown = by_category(&expenses, 1000.0);

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].category, "Food");
        assert_eq!(breakdown[0].total, 45.5);
        assert_close!(breakdown[0].percent_of_budget, 4.55);
        assert_eq!(breakdown[1].category, "Transport");
        assert_eq!(breakdown[1].total, 22.0);
    }

    #[test]
    fn by_category_is_sparse() {
        let expenses = vec![record(1, "Ana", 45.5, "Food")];

        let breakdown = by_category(&expenses, 1000.0);

        assert_eq!(breakdown.len(), 1);
        assert!(breakdown.iter().all(|row| row.total > 0.0));
    }

    #[test]
    fn by_category_totals_sum_to_overall_total() {
        let expenses = vec![
            record(1, "Ana", 45.5, "Food"),
            record(1, "Ana", 12.5, "Food"),
            record(2, "Ben", 22.0, "Transport"),
            record(3, "Cleo", 8.5, "Activities"),
        ];

        let breakdown = by_category(&expenses, 1000.0);
        let breakdown_sum: f64 = breakdown.iter().map(|row| row.total).sum();

        assert_eq!(breakdown_sum, total_of(&expenses));
    }

    #[test]
    fn by_category_sorts_largest_first() {
        let expenses = vec![
            record(1, "Ana", 10.0, "Food"),
            record(1, "Ana", 100.0, "Accommodation"),
            record(1, "Ana", 50.0, "Transport"),
        ];

        let breakdown = by_category(&expenses, 0.0);

        let categories: Vec<&str> =
            breakdown.iter().map(|row| row.category.as_str()).collect();
        assert_eq!(categories, vec!["Accommodation", "Transport", "Food"]);
    }

    #[test]
    fn by_user_accumulates_totals_and_counts() {
        let expenses = vec![
            record(1, "Ana", 45.5, "Food"),
            record(1, "Ana", 120.0, "Accommodation"),
            record(2, "Ben", 22.0, "Transport"),
        ];

        let breakdown = by_user(&expenses);

        assert_eq!(breakdown.len(), 2);
        assert_eq!(breakdown[0].name, "Ana");
        assert_eq!(breakdown[0].total, 165.5);
        assert_eq!(breakdown[0].count, 2);
        assert_eq!(breakdown[0].email, "ana@example.com");
        assert_eq!(breakdown[1].name, "Ben");
        assert_eq!(breakdown[1].count, 1);
    }

    #[test]
    fn by_user_of_empty_is_empty() {
        assert!(by_user(&[]).is_empty());
    }
}
