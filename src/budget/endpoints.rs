//! Handlers for setting the personal budget and logging personal expenses.

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error,
    budget::{
        BudgetState,
        db::{get_personal_budget, set_personal_budget},
        page::{PersonalExpenseForm, SetBudgetForm, render_personal_budget_page},
    },
    endpoints,
    expense::{ExpenseDraft, create_expense, personal_total_spent},
    group::validate_budget,
    timezone::local_date,
    user::{UserId, get_user_by_id},
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Handler for setting the personal budget.
///
/// The budget is set exactly once; a second attempt is rejected and the
/// stored value is left untouched.
pub async fn set_personal_budget_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<SetBudgetForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = local_date(&state.local_timezone);

    let user = get_user_by_id(user_id, &connection)?;
    if !user.role.capabilities().can_edit {
        let page = render_personal_budget_page(
            user_id,
            &PersonalExpenseForm::default(),
            today,
            Some("Your account role does not allow setting a budget."),
            None,
            &connection,
        )?;
        return Ok(page.into_response());
    }

    let outcome = form
        .amount
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidBudget)
        .and_then(validate_budget)
        .and_then(|amount| set_personal_budget(user_id, amount, &connection));

    if let Err(error) = outcome {
        let page = render_personal_budget_page(
            user_id,
            &PersonalExpenseForm::default(),
            today,
            Some(&error.to_string()),
            None,
            &connection,
        )?;
        return Ok(page.into_response());
    }

    tracing::info!("user {user_id} set their personal budget");

    Ok(Redirect::to(endpoints::PERSONAL_BUDGET_VIEW).into_response())
}

/// Handler for logging an expense against the personal budget.
///
/// Unlike group expenses, a personal expense that would overrun the
/// remaining budget is rejected outright.
pub async fn create_personal_expense_endpoint(
    State(state): State<BudgetState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<PersonalExpenseForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let today = local_date(&state.local_timezone);

    let user = get_user_by_id(user_id, &connection)?;
    if !user.role.capabilities().can_edit {
        let page = render_personal_budget_page(
            user_id,
            &form,
            today,
            None,
            Some("Your account role does not allow logging expenses."),
            &connection,
        )?;
        return Ok(page.into_response());
    }

    let budget = match get_personal_budget(user_id, &connection)? {
        Some(budget) => budget,
        None => {
            let page = render_personal_budget_page(
                user_id,
                &form,
                today,
                None,
                Some("Set a budget before logging expenses."),
                &connection,
            )?;
            return Ok(page.into_response());
        }
    };

    let draft = match to_draft(&form) {
        Ok(draft) => draft,
        Err(error) => {
            let page = render_personal_budget_page(
                user_id,
                &form,
                today,
                None,
                Some(&error.to_string()),
                &connection,
            )?;
            return Ok(page.into_response());
        }
    };

    let left = budget - personal_total_spent(user_id, &connection)?;
    if draft.amount > left {
        let page = render_personal_budget_page(
            user_id,
            &form,
            today,
            None,
            Some(&Error::OverBudget(left).to_string()),
            &connection,
        )?;
        return Ok(page.into_response());
    }

    create_expense(draft, None, user_id, &connection)?;

    Ok(Redirect::to(endpoints::PERSONAL_BUDGET_VIEW).into_response())
}

fn to_draft(form: &PersonalExpenseForm) -> Result<ExpenseDraft, Error> {
    let amount = form
        .amount
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidAmount)?;

    let expense_date = Date::parse(form.expense_date.trim(), DATE_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), form.expense_date.clone()))?;

    ExpenseDraft::new(amount, &form.description, &form.category, expense_date)
}
