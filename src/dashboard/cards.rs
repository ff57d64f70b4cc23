//! Card components for the group dashboard's budget summary.

use maud::{Markup, html};

use crate::html::format_currency;

/// The figures shown in the summary cards.
pub(super) struct BudgetSummary {
    /// The group's budget ceiling.
    pub total_budget: f64,
    /// The sum of all expenses.
    pub total_spent: f64,
    /// Budget minus spending. Negative when over budget.
    pub remaining: f64,
    /// Percentage of the budget spent, capped at 100.
    pub progress: f64,
    /// How many members the group has.
    pub member_count: usize,
    /// How many expenses have been logged.
    pub expense_count: usize,
}

/// Renders the row of budget summary cards and the progress bar.
pub(super) fn budget_cards_view(summary: &BudgetSummary) -> Markup {
    let over_budget = summary.remaining < 0.0;

    html! {
        section class="card-grid"
        {
            div class="stat-card"
            {
                p class="stat-label" { "Total Budget" }
                p class="stat-value" { (format_currency(summary.total_budget)) }
            }

            div class="stat-card"
            {
                p class="stat-label" { "Total Spent" }
                p class="stat-value" { (format_currency(summary.total_spent)) }
                p class="stat-detail"
                {
                    (summary.expense_count) " expenses by " (summary.member_count) " members"
                }
            }

            div class="stat-card"
            {
                p class="stat-label" { "Remaining" }
                p class=(if over_budget { "stat-value over-budget" } else { "stat-value" })
                {
                    (format_currency(summary.remaining))
                }
                @if over_budget
                {
                    p class="stat-detail over-budget" { "Over budget" }
                }
            }
        }

        section class="progress-section"
        {
            div class="progress-track"
            {
                div
                    class=(if over_budget { "progress-fill progress-fill-over" } else { "progress-fill" })
                    style=(format!("width: {:.0}%", summary.progress)) {}
            }
            p class="progress-caption" { (format!("{:.1}% of budget used", summary.progress)) }
        }
    }
}
