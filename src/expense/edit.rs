//! The page and endpoints for editing and deleting an existing expense.

use axum::{
    Extension, Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    Error, endpoints,
    expense::{
        ExpenseState,
        create::{ExpenseForm, expense_fields},
        db::{delete_expense, get_expense, update_expense},
        domain::{Expense, ExpenseId},
    },
    group::{Group, MemberRole, add_custom_category, get_group, get_membership_role},
    html::{base, form_error},
    navigation::NavBar,
    user::{User, UserId, get_user_by_id},
};

/// Whether `user` may change or remove this expense.
///
/// The payer may edit their own expense; the group admin may edit any
/// expense in the group; an account-level Admin may remove anything. A
/// Viewer may do none of these.
fn can_modify(expense: &Expense, user: &User, member_role: Option<MemberRole>) -> bool {
    let capabilities = user.role.capabilities();

    if !capabilities.can_edit && !capabilities.can_delete {
        return false;
    }

    expense.user_id == user.id
        || member_role == Some(MemberRole::Admin)
        || capabilities.can_delete
}

/// Look up the expense and check the caller may modify it.
///
/// Returns the expense, its group (when group-scoped), and the caller's
/// membership role.
fn load_for_modification(
    expense_id: ExpenseId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(Expense, Option<Group>, Option<MemberRole>), Error> {
    let expense = get_expense(expense_id, connection)?;

    let (group, member_role) = match expense.group_id {
        Some(group_id) => {
            let member_role = get_membership_role(group_id, user_id, connection)?;
            (Some(get_group(group_id, connection)?), Some(member_role))
        }
        None => {
            // Personal expenses are only ever visible to their owner.
            if expense.user_id != user_id {
                return Err(Error::NotFound);
            }
            (None, None)
        }
    };

    let user = get_user_by_id(user_id, connection)?;
    if !can_modify(&expense, &user, member_role) {
        return Err(Error::PermissionDenied);
    }

    Ok((expense, group, member_role))
}

fn back_url(expense: &Expense) -> String {
    match expense.group_id {
        Some(group_id) => endpoints::format_endpoint(endpoints::GROUP_EXPENSES_VIEW, group_id),
        None => endpoints::PERSONAL_BUDGET_VIEW.to_string(),
    }
}

/// Display the edit form for an expense.
pub async fn get_edit_expense_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (expense, group, _) = load_for_modification(expense_id, user_id, &connection)?;

    let form = ExpenseForm {
        amount: format!("{:.2}", expense.amount),
        description: expense.description.clone(),
        category: expense.category.clone(),
        new_category: String::new(),
        expense_date: expense.expense_date.to_string(),
    };

    Ok(edit_expense_view(&expense, group.as_ref(), &form, None).into_response())
}

fn edit_expense_view(
    expense: &Expense,
    group: Option<&Group>,
    form: &ExpenseForm,
    error_message: Option<&str>,
) -> Markup {
    let update_url = endpoints::format_endpoint(endpoints::UPDATE_EXPENSE, expense.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_EXPENSE, expense.id);

    let content = html! {
        (NavBar::new(endpoints::GROUPS_VIEW).into_html())

        main class="page"
        {
            header class="page-header"
            {
                h1 { "Edit expense" }
                p class="subtitle"
                {
                    a href=(back_url(expense)) { "Back" }
                }
            }

            section class="form-card"
            {
                form method="post" action=(update_url)
                {
                    @if let Some(message) = error_message
                    {
                        (form_error(message))
                    }

                    @match group
                    {
                        Some(group) => (expense_fields(group, form, &form.expense_date)),
                        None => (personal_expense_fields(form)),
                    }

                    button type="submit" class="button" { "Save changes" }
                }
            }

            section class="form-card danger-zone"
            {
                h2 { "Delete this expense" }

                form method="post" action=(delete_url)
                {
                    div class="form-row"
                    {
                        input type="checkbox" name="confirm" id="confirm" required;
                        label for="confirm" { "I'm sure" }
                    }

                    button type="submit" class="button button-danger" { "Delete expense" }
                }
            }
        }
    };

    base("Edit Expense", &content)
}

/// The field set for editing a personal expense, which has a free-text
/// category instead of the group select.
fn personal_expense_fields(form: &ExpenseForm) -> Markup {
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
            maxlength=(crate::expense::MAX_DESCRIPTION_LENGTH)
            value=(form.description)
            required;

        label for="category" { "Category" }
        input type="text" name="category" id="category" value=(form.category) required;

        label for="expense_date" { "Date" }
        input
            type="date"
            name="expense_date"
            id="expense_date"
            value=(form.expense_date)
            required;
    }
}

/// Handler for applying an edit to an expense.
///
/// Marks the expense as edited. A brand-new category is registered on the
/// group before the expense row changes.
pub async fn update_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(expense_id): Path<ExpenseId>,
    Form(form): Form<ExpenseForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (expense, group, _) = load_for_modification(expense_id, user_id, &connection)?;

    let draft = match form.to_draft() {
        Ok(draft) => draft,
        Err(error) => {
            let page =
                edit_expense_view(&expense, group.as_ref(), &form, Some(&error.to_string()));
            return Ok(page.into_response());
        }
    };

    if let Some(group_id) = expense.group_id {
        add_custom_category(group_id, &draft.category, &connection)?;
    }
    update_expense(expense_id, draft, &connection)?;

    Ok(Redirect::to(&back_url(&expense)).into_response())
}

/// The confirmation checkbox for deleting an expense.
#[derive(Deserialize)]
pub struct DeleteExpenseForm {
    /// Present when the user ticked the confirmation checkbox.
    pub confirm: Option<String>,
}

/// Handler for deleting an expense.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(expense_id): Path<ExpenseId>,
    Form(form): Form<DeleteExpenseForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let (expense, _, _) = load_for_modification(expense_id, user_id, &connection)?;

    if form.confirm.is_none() {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, expense_id);
        return Ok(Redirect::to(&edit_url).into_response());
    }

    delete_expense(expense_id, &connection)?;
    tracing::info!("user {user_id} deleted expense {expense_id}");

    Ok(Redirect::to(&back_url(&expense)).into_response())
}

#[cfg(test)]
mod edit_expense_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        expense::{
            ExpenseState,
            db::{create_expense, get_expense},
            domain::{Expense, ExpenseDraft},
        },
        group::{Group, TripName, create_group, join_group},
        user::{Role, User, create_user},
    };

    use super::{
        DeleteExpenseForm, ExpenseForm, delete_expense_endpoint, update_expense_endpoint,
    };

    fn get_test_state() -> ExpenseState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        ExpenseState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_string(),
        }
    }

    fn create_test_user(email: &str, role: Role, state: &ExpenseState) -> User {
        let connection = state.db_connection.lock().unwrap();
        create_user(
            email,
            "Test Traveler",
            role,
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user")
    }

    fn create_test_group(admin: &User, state: &ExpenseState) -> Group {
        let connection = state.db_connection.lock().unwrap();
        create_group(
            TripName::new_unchecked("Japan"),
            5000.0,
            admin.id,
            &connection,
        )
        .expect("Could not create test group")
    }

    fn create_test_expense(user: &User, group: &Group, state: &ExpenseState) -> Expense {
        let connection = state.db_connection.lock().unwrap();
        create_expense(
            ExpenseDraft::new(45.5, "Ramen lunch", "Food", date!(2026 - 03 - 01)).unwrap(),
            Some(group.id),
            user.id,
            &connection,
        )
        .expect("Could not create test expense")
    }

    fn edit_form(amount: &str) -> ExpenseForm {
        ExpenseForm {
            amount: amount.to_string(),
            description: "Ramen and gyoza".to_string(),
            category: "Food".to_string(),
            new_category: String::new(),
            expense_date: "2026-03-01".to_string(),
        }
    }

    #[tokio::test]
    async fn owner_can_update_their_expense() {
        let state = get_test_state();
        let user = create_test_user("ana@example.com", Role::User, &state);
        let group = create_test_group(&user, &state);
        let expense = create_test_expense(&user, &group, &state);

        update_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(expense.id),
            Form(edit_form("50.00")),
        )
        .await
        .expect("Handler returned an error");

        let connection = state.db_connection.lock().unwrap();
        let updated = get_expense(expense.id, &connection).unwrap();
        assert_eq!(updated.amount, 50.0);
        assert!(updated.is_edited);
    }

    #[tokio::test]
    async fn group_admin_can_update_someone_elses_expense() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", Role::User, &state);
        let member = create_test_user("ben@example.com", Role::User, &state);
        let group = create_test_group(&admin, &state);
        {
            let connection = state.db_connection.lock().unwrap();
            join_group(group.id, member.id, &connection).unwrap();
        }
        let expense = create_test_expense(&member, &group, &state);

        let result = update_expense_endpoint(
            State(state.clone()),
            Extension(admin.id),
            Path(expense.id),
            Form(edit_form("60.00")),
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn regular_member_cannot_update_someone_elses_expense() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", Role::User, &state);
        let member = create_test_user("ben@example.com", Role::User, &state);
        let group = create_test_group(&admin, &state);
        {
            let connection = state.db_connection.lock().unwrap();
            join_group(group.id, member.id, &connection).unwrap();
        }
        let expense = create_test_expense(&admin, &group, &state);

        let result = update_expense_endpoint(
            State(state.clone()),
            Extension(member.id),
            Path(expense.id),
            Form(edit_form("60.00")),
        )
        .await;

        assert!(matches!(result, Err(Error::PermissionDenied)));
    }

    #[tokio::test]
    async fn delete_with_confirmation_removes_expense() {
        let state = get_test_state();
        let user = create_test_user("ana@example.com", Role::User, &state);
        let group = create_test_group(&user, &state);
        let expense = create_test_expense(&user, &group, &state);

        delete_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(expense.id),
            Form(DeleteExpenseForm {
                confirm: Some("on".to_string()),
            }),
        )
        .await
        .expect("Handler returned an error");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_expense(expense.id, &connection), Err(Error::NotFound));
    }

    #[tokio::test]
    async fn delete_without_confirmation_keeps_expense() {
        let state = get_test_state();
        let user = create_test_user("ana@example.com", Role::User, &state);
        let group = create_test_group(&user, &state);
        let expense = create_test_expense(&user, &group, &state);

        delete_expense_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(expense.id),
            Form(DeleteExpenseForm { confirm: None }),
        )
        .await
        .expect("Handler returned an error");

        let connection = state.db_connection.lock().unwrap();
        assert!(get_expense(expense.id, &connection).is_ok());
    }
}
