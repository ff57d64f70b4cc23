//! Table views for the dashboard's category and member breakdowns.

use maud::{Markup, html};

use crate::{
    html::format_currency,
    stats::{CategoryTotal, MemberSpending},
};

/// Renders the spending-by-category table, largest total first.
///
/// Categories with no expenses are not shown.
pub(super) fn category_breakdown_table(breakdown: &[CategoryTotal]) -> Markup {
    if breakdown.is_empty() {
        return html! {};
    }

    html! {
        section
        {
            h2 { "Spending by Category" }

            table class="data-table"
            {
                thead
                {
                    tr
                    {
                        th { "Category" }
                        th class="numeric" { "Amount" }
                        th class="numeric" { "% of Budget" }
                    }
                }
                tbody
                {
                    @for row in breakdown
                    {
                        tr
                        {
                            td { (row.category) }
                            td class="numeric" { (format_currency(row.total)) }
                            td class="numeric" { (format!("{:.1}%", row.percent_of_budget)) }
                        }
                    }
                }
            }
        }
    }
}

/// Renders the spending-by-member table, biggest spender first.
pub(super) fn member_breakdown_table(breakdown: &[MemberSpending]) -> Markup {
    if breakdown.is_empty() {
        return html! {};
    }

    html! {
        section
        {
            h2 { "Spending by Member" }

            table class="data-table"
            {
                thead
                {
                    tr
                    {
                        th { "Member" }
                        th class="numeric" { "Expenses" }
                        th class="numeric" { "Total" }
                    }
                }
                tbody
                {
                    @for row in breakdown
                    {
                        tr
                        {
                            td { (row.name) }
                            td class="numeric" { (row.count) }
                            td class="numeric" { (format_currency(row.total)) }
                        }
                    }
                }
            }
        }
    }
}
