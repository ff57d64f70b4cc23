//! The personal budget page: the one-time budget form, the summary figures
//! and the personal expense ledger.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    budget::{BudgetState, db::get_personal_budget},
    endpoints,
    expense::{ExpenseRecord, MAX_DESCRIPTION_LENGTH, get_personal_expense_records},
    group::DEFAULT_CATEGORIES,
    html::{base, form_error, format_currency},
    navigation::NavBar,
    stats::{budget_progress, remaining, total_of},
    timezone::local_date,
    user::UserId,
};

/// The data entered into the set-budget form.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct SetBudgetForm {
    /// The budget ceiling. Kept as a string so a non-numeric value renders
    /// a validation message instead of a 422.
    pub amount: String,
}

/// The data entered into the personal expense form.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PersonalExpenseForm {
    /// How much was spent.
    pub amount: String,
    /// What the money was spent on.
    pub description: String,
    /// The chosen category from the select box.
    #[serde(default)]
    pub category: String,
    /// The calendar date of the expense, `YYYY-MM-DD`.
    pub expense_date: String,
}

/// Display the personal budget page.
///
/// Shows the set-budget form until a budget exists, then the summary and
/// the expense ledger.
pub async fn get_personal_budget_page(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = local_date(&state.local_timezone);
    let page = render_personal_budget_page(
        user_id,
        &PersonalExpenseForm::default(),
        today,
        None,
        None,
        &connection,
    )?;

    Ok(page.into_response())
}

pub(super) fn render_personal_budget_page(
    user_id: UserId,
    expense_form: &PersonalExpenseForm,
    default_date: Date,
    budget_error: Option<&str>,
    expense_error: Option<&str>,
    connection: &Connection,
) -> Result<Markup, Error> {
    let budget = get_personal_budget(user_id, connection)?;
    let records = get_personal_expense_records(user_id, connection)?;

    Ok(personal_budget_view(
        budget,
        &records,
        expense_form,
        default_date,
        budget_error,
        expense_error,
    ))
}

fn personal_budget_view(
    budget: Option<f64>,
    records: &[ExpenseRecord],
    expense_form: &PersonalExpenseForm,
    default_date: Date,
    budget_error: Option<&str>,
    expense_error: Option<&str>,
) -> Markup {
    let content = html! {
        (NavBar::new(endpoints::PERSONAL_BUDGET_VIEW).into_html())

        main class="page"
        {
            header class="page-header"
            {
                h1 { "My Budget" }
            }

            @if let Some(budget) = budget
            {
                (summary_section(budget, records))
                (expense_form_section(expense_form, default_date, expense_error))
                (ledger_section(records))
            }
            @else
            {
                (set_budget_section(budget_error))
            }
        }
    };

    base("My Budget", &content)
}

fn set_budget_section(budget_error: Option<&str>) -> Markup {
    html! {
        section class="form-card"
        {
            h2 { "Set your budget" }
            p
            {
                "Pick the ceiling for your personal spending. A personal \
                budget can only be set once, so choose carefully."
            }

            form method="post" action=(endpoints::SET_PERSONAL_BUDGET)
            {
                @if let Some(message) = budget_error
                {
                    (form_error(message))
                }

                label for="amount" { "Budget" }
                input
                    type="number"
                    name="amount"
                    id="amount"
                    min="0.01"
                    step="0.01"
                    required
                    autofocus;

                button type="submit" class="button" { "Set budget" }
            }
        }
    }
}

fn summary_section(budget: f64, records: &[ExpenseRecord]) -> Markup {
    let spent = total_of(records);
    let left = remaining(budget, records);
    let progress = budget_progress(budget, records);
    let over_budget = left < 0.0;

    html! {
        section class="stat-cards"
        {
            div class="stat-card"
            {
                p class="stat-label" { "Budget" }
                p class="stat-value" { (format_currency(budget)) }
            }
            div class="stat-card"
            {
                p class="stat-label" { "Spent" }
                p class="stat-value" { (format_currency(spent)) }
            }
            div class="stat-card"
            {
                p class="stat-label" { "Remaining" }
                p class=(if over_budget { "stat-value stat-value-negative" } else { "stat-value" })
                {
                    (format_currency(left))
                }
            }
            div class="stat-card"
            {
                p class="stat-label" { "Used" }
                p class="stat-value" { (format!("{progress:.0}%")) }
            }
        }
    }
}

fn expense_form_section(
    form: &PersonalExpenseForm,
    default_date: Date,
    expense_error: Option<&str>,
) -> Markup {
    let date_value = if form.expense_date.is_empty() {
        default_date.to_string()
    } else {
        form.expense_date.clone()
    };

    html! {
        section class="form-card"
        {
            h2 { "Log an expense" }

            form method="post" action=(endpoints::CREATE_PERSONAL_EXPENSE)
            {
                @if let Some(message) = expense_error
                {
                    (form_error(message))
                }

                label for="amount" { "Amount" }
                input
                    type="number"
                    name="amount"
                    id="amount"
                    min="0.01"
                    step="0.01"
                    value=(form.amount)
                    required;

                label for="description" { "Description" }
                input
                    type="text"
                    name="description"
                    id="description"
                    maxlength=(MAX_DESCRIPTION_LENGTH)
                    value=(form.description)
                    required;

                label for="category" { "Category" }
                select name="category" id="category"
                {
                    @for category in DEFAULT_CATEGORIES
                    {
                        option value=(category) selected[form.category == category]
                        {
                            (category)
                        }
                    }
                }

                label for="expense_date" { "Date" }
                input
                    type="date"
                    name="expense_date"
                    id="expense_date"
                    value=(date_value)
                    required;

                button type="submit" class="button" { "Log expense" }
            }
        }
    }
}

fn ledger_section(records: &[ExpenseRecord]) -> Markup {
    html! {
        section
        {
            h2 { "Expenses" }

            @if records.is_empty()
            {
                p class="empty-state" { "Nothing spent yet." }
            }
            @else
            {
                table class="expense-table"
                {
                    thead
                    {
                        tr
                        {
                            th { "Date" }
                            th { "Category" }
                            th { "Description" }
                            th class="amount" { "Amount" }
                        }
                    }
                    tbody
                    {
                        @for record in records
                        {
                            tr
                            {
                                td { (record.expense_date) }
                                td { (record.category) }
                                td
                                {
                                    (record.description)
                                    @if record.is_edited
                                    {
                                        span class="badge" { "edited" }
                                    }
                                }
                                td class="amount" { (format_currency(record.amount)) }
                            }
                        }
                    }
                }
            }
        }
    }
}
