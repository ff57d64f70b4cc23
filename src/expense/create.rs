//! The page and endpoint for logging a new expense against a group.

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error, endpoints,
    expense::{
        ExpenseState,
        db::create_expense,
        domain::{ExpenseDraft, MAX_DESCRIPTION_LENGTH},
    },
    group::{Group, GroupId, add_custom_category, get_group, get_membership_role},
    html::{base, form_error},
    navigation::NavBar,
    timezone::local_date,
    user::{UserId, get_user_by_id},
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Display the form for logging a new expense.
pub async fn get_new_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_membership_role(group_id, user_id, &connection)?;
    let group = get_group(group_id, &connection)?;

    let today = local_date(&state.local_timezone);
    let page = new_expense_view(&group, &ExpenseForm::default(), today, None);

    Ok(page.into_response())
}

/// The data entered into the expense form.
///
/// Numeric fields are kept as strings so a bad value renders a validation
/// message instead of a 422.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExpenseForm {
    /// How much was spent.
    pub amount: String,
    /// What the money was spent on.
    pub description: String,
    /// The chosen category from the select box.
    #[serde(default)]
    pub category: String,
    /// A new category typed in by the user. Takes precedence over the
    /// select box when non-empty.
    #[serde(default)]
    pub new_category: String,
    /// The calendar date of the expense, `YYYY-MM-DD`.
    pub expense_date: String,
}

impl ExpenseForm {
    /// The effective category: a typed-in new category wins over the select.
    pub fn effective_category(&self) -> &str {
        let new_category = self.new_category.trim();
        if new_category.is_empty() {
            self.category.trim()
        } else {
            new_category
        }
    }

    /// Validate the form into an [ExpenseDraft].
    pub fn to_draft(&self) -> Result<ExpenseDraft, Error> {
        let amount = self
            .amount
            .trim()
            .parse::<f64>()
            .map_err(|_| Error::InvalidAmount)?;

        let expense_date = Date::parse(self.expense_date.trim(), DATE_FORMAT).map_err(|error| {
            Error::InvalidDateFormat(error.to_string(), self.expense_date.clone())
        })?;

        ExpenseDraft::new(amount, &self.description, self.effective_category(), expense_date)
    }
}

pub(super) fn new_expense_view(
    group: &Group,
    form: &ExpenseForm,
    default_date: Date,
    error_message: Option<&str>,
) -> Markup {
    let create_url = endpoints::format_endpoint(endpoints::CREATE_EXPENSE, group.id);
    let expenses_url = endpoints::format_endpoint(endpoints::GROUP_EXPENSES_VIEW, group.id);
    let date_value = if form.expense_date.is_empty() {
        default_date.to_string()
    } else {
        form.expense_date.clone()
    };

    let content = html! {
        (NavBar::new(endpoints::GROUPS_VIEW).into_html())

        main class="page"
        {
            header class="page-header"
            {
                h1 { (group.trip_name) " · New expense" }
                p class="subtitle"
                {
                    a href=(expenses_url) { "Back to expenses" }
                }
            }

            section class="form-card"
            {
                form method="post" action=(create_url)
                {
                    @if let Some(message) = error_message
                    {
                        (form_error(message))
                    }

                    (expense_fields(group, form, &date_value))

                    button type="submit" class="button" { "Log expense" }
                }
            }
        }
    };

    base("New Expense", &content)
}

/// The shared field set for the create and edit expense forms.
pub(super) fn expense_fields(group: &Group, form: &ExpenseForm, date_value: &str) -> Markup {
    html! {
        label for="amount" { "Amount" }
        input
            type="number"
            name="amount"
            id="amount"
            min="0.01"
            step="0.01"
            value=(form.amount)
            required
            autofocus;

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
            @for category in group.categories()
            {
                option value=(category) selected[form.category == category]
                {
                    (category)
                }
            }
        }

        label for="new_category" { "Or add a new category" }
        input
            type="text"
            name="new_category"
            id="new_category"
            value=(form.new_category)
            placeholder="e.g. Onsen";

        label for="expense_date" { "Date" }
        input
            type="date"
            name="expense_date"
            id="expense_date"
            value=(date_value)
            required;
    }
}

/// Handler for logging a new expense.
///
/// A brand-new category is registered on the group before the expense is
/// written, so the expense insert is the last, most visible write.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
    Form(form): Form<ExpenseForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_membership_role(group_id, user_id, &connection)?;
    let group = get_group(group_id, &connection)?;

    let today = local_date(&state.local_timezone);

    let user = get_user_by_id(user_id, &connection)?;
    if !user.role.capabilities().can_edit {
        let page = new_expense_view(
            &group,
            &form,
            today,
            Some("Your account role does not allow logging expenses."),
        );
        return Ok(page.into_response());
    }

    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(error) => {
            let page = new_expense_view(&group, &form, today, Some(&error.to_string()));
            return Ok(page.into_response());
        }
    };

    add_custom_category(group_id, &draft.category, &connection)?;
    create_expense(draft, Some(group_id), user_id, &connection)?;

    let expenses_url = endpoints::format_endpoint(endpoints::GROUP_EXPENSES_VIEW, group_id);
    Ok(Redirect::to(&expenses_url).into_response())
}
