//! Rendering a trip log as a single self-contained HTML document.
//!
//! The document carries its own styles inline and references no scripts,
//! images or remote resources, so a downloaded trip log opens identically
//! with or without a network connection.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::{html::format_currency, report::TripLog};

/// The styles embedded in every exported trip log.
const REPORT_STYLES: &str = "\
    body { font-family: Georgia, 'Times New Roman', serif; margin: 2rem auto; \
           max-width: 48rem; color: #222; }\
    h1 { border-bottom: 2px solid #222; padding-bottom: 0.3rem; }\
    h2 { margin-top: 2rem; }\
    table { border-collapse: collapse; width: 100%; }\
    th, td { border: 1px solid #999; padding: 0.4rem 0.6rem; text-align: left; }\
    th { background: #eee; }\
    td.amount, th.amount { text-align: right; }\
    .summary dt { font-weight: bold; float: left; clear: left; width: 10rem; }\
    .summary dd { margin: 0 0 0.3rem 10rem; }\
    .over-budget { color: #a00; font-weight: bold; }\
    footer { margin-top: 3rem; font-size: 0.85rem; color: #555; \
             border-top: 1px solid #999; padding-top: 0.5rem; }";

/// Render a [TripLog] as a standalone HTML document.
pub fn render_trip_log_html(trip_log: &TripLog) -> String {
    let stats = &trip_log.stats;
    let over_budget = stats.remaining < 0.0;

    let document: Markup = html! {
        (DOCTYPE)
        html lang="en"
        {
            head
            {
                meta charset="UTF-8";
                title { "Trip Log - " (trip_log.group.trip_name) }
                style { (PreEscaped(REPORT_STYLES)) }
            }

            body
            {
                h1 { "Trip Log: " (trip_log.group.trip_name) }
                p
                {
                    "Generated on " (trip_log.generated_on)
                    " · " (stats.member_count) " member"
                    @if stats.member_count != 1 { "s" }
                    " · " (stats.expense_count) " expense"
                    @if stats.expense_count != 1 { "s" }
                }

                h2 { "Budget summary" }
                dl class="summary"
                {
                    dt { "Total budget" }
                    dd { (format_currency(stats.total_budget)) }
                    dt { "Total spent" }
                    dd { (format_currency(stats.total_spent)) }
                    dt { "Remaining" }
                    dd class=[over_budget.then_some("over-budget")]
                    {
                        (format_currency(stats.remaining))
                        @if over_budget { " (over budget)" }
                    }
                }

                h2 { "Spending by category" }
                (category_table(trip_log))

                h2 { "Spending by member" }
                (member_table(trip_log))

                h2 { "Expense ledger" }
                (ledger_table(trip_log))

                footer
                {
                    p
                    {
                        "Invite code: " (trip_log.group.invite_code)
                        " · Exported from Tripledger"
                    }
                }
            }
        }
    };

    document.into_string()
}

fn category_table(trip_log: &TripLog) -> Markup {
    html! {
        table
        {
            thead
            {
                tr
                {
                    th { "Category" }
                    th class="amount" { "Amount" }
                    th class="amount" { "% of budget" }
                }
            }
            tbody
            {
                @for row in &trip_log.stats.category_breakdown
                {
                    tr
                    {
                        td { (row.category) }
                        td class="amount" { (format_currency(row.total)) }
                        td class="amount" { (format!("{:.1}%", row.percent_of_budget)) }
                    }
                }
            }
        }
    }
}

fn member_table(trip_log: &TripLog) -> Markup {
    html! {
        table
        {
            thead
            {
                tr
                {
                    th { "Member" }
                    th { "Email" }
                    th class="amount" { "Expenses" }
                    th class="amount" { "Total" }
                }
            }
            tbody
            {
                @for row in &trip_log.stats.member_spending
                {
                    tr
                    {
                        td { (row.name) }
                        td { (row.email) }
                        td class="amount" { (row.count) }
                        td class="amount" { (format_currency(row.total)) }
                    }
                }
            }
        }
    }
}

fn ledger_table(trip_log: &TripLog) -> Markup {
    html! {
        table
        {
            thead
            {
                tr
                {
                    th { "Date" }
                    th { "Member" }
                    th { "Category" }
                    th { "Description" }
                    th class="amount" { "Amount" }
                }
            }
            tbody
            {
                @for expense in &trip_log.expenses
                {
                    tr
                    {
                        td { (expense.expense_date) }
                        td { (expense.paid_by_name) }
                        td { (expense.category) }
                        td
                        {
                            (expense.description)
                            @if expense.is_edited { " (edited)" }
                        }
                        td class="amount" { (format_currency(expense.amount)) }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod render_trip_log_html_tests {
    use time::macros::{date, datetime};

    use crate::{
        expense::ExpenseRecord,
        group::{Group, InviteCode, Member, MemberRole, TripName},
        report::{TripLog, TripLogStats},
        stats::{by_category, by_user, remaining, total_of},
        user::UserId,
    };

    use super::render_trip_log_html;

    fn record(day: u8, name: &str, amount: f64, description: &str, category: &str) -> ExpenseRecord {
        ExpenseRecord {
            id: 0,
            user_id: UserId::new(1),
            paid_by_name: name.to_string(),
            paid_by_email: format!("{}@example.com", name.to_lowercase()),
            amount,
            description: description.to_string(),
            category: category.to_string(),
            expense_date: date!(2026 - 03 - 01).replace_day(day).unwrap(),
            created_at: datetime!(2026-03-01 12:00 UTC),
            is_edited: false,
        }
    }

    fn japan_trip_log() -> TripLog {
        let expenses = vec![
            record(1, "Ana", 45.5, "Cafe lunch", "Food"),
            record(5, "Ben", 22.0, "Taxi to the ryokan", "Transport"),
        ];
        let total_budget = 1000.0;

        TripLog {
            group: Group {
                id: 1,
                trip_name: TripName::new_unchecked("Japan 2026"),
                total_budget,
                invite_code: InviteCode::new_unchecked("ABCD1234"),
                created_by: UserId::new(1),
                is_active: true,
                custom_categories: vec![],
            },
            members: vec![Member {
                user_id: UserId::new(1),
                full_name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                role: MemberRole::Admin,
            }],
            stats: TripLogStats {
                total_budget,
                total_spent: total_of(&expenses),
                remaining: remaining(total_budget, &expenses),
                member_count: 1,
                expense_count: expenses.len(),
                category_breakdown: by_category(&expenses, total_budget),
                member_spending: by_user(&expenses),
            },
            expenses,
            generated_on: date!(2026 - 03 - 10),
        }
    }

    #[test]
    fn document_contains_no_external_references() {
        let document = render_trip_log_html(&japan_trip_log());

        assert!(!document.contains("http://"));
        assert!(!document.contains("https://"));
        assert!(!document.contains("src="));
        assert!(!document.contains("<script"));
        assert!(!document.contains("<link"));
    }

    #[test]
    fn document_shows_budget_figures_with_two_decimals() {
        let document = render_trip_log_html(&japan_trip_log());

        assert!(document.contains("$1,000.00"));
        assert!(document.contains("$67.50"));
        assert!(document.contains("$932.50"));
    }

    #[test]
    fn category_percentages_have_one_decimal_place() {
        let document = render_trip_log_html(&japan_trip_log());

        assert!(document.contains("4.5%"), "Food is 45.50 of 1000.00");
        assert!(document.contains("2.2%"), "Transport is 22.00 of 1000.00");
    }

    #[test]
    fn ledger_is_chronological() {
        let document = render_trip_log_html(&japan_trip_log());

        let cafe = document.find("Cafe lunch").expect("cafe expense missing");
        let taxi = document.find("Taxi to the ryokan").expect("taxi expense missing");

        assert!(cafe < taxi, "earlier expense should appear first");
    }

    #[test]
    fn over_budget_trip_is_flagged() {
        let mut trip_log = japan_trip_log();
        trip_log.stats.remaining = -17.5;

        let document = render_trip_log_html(&trip_log);

        assert!(document.contains("over budget"));
        assert!(document.contains("-$17.50"));
    }

    #[test]
    fn footer_shows_the_invite_code() {
        let document = render_trip_log_html(&japan_trip_log());

        assert!(document.contains("ABCD1234"));
    }

    #[test]
    fn edited_expenses_are_marked() {
        let mut trip_log = japan_trip_log();
        trip_log.expenses[0].is_edited = true;

        let document = render_trip_log_html(&trip_log);

        assert!(document.contains("(edited)"));
    }
}
