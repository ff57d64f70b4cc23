//! The group settings page: invite code, member list, budget edits, and
//! group deletion.

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
    group::{
        GroupState,
        db::{delete_group, get_group, get_members, get_membership_role, update_budget},
        domain::{Group, GroupId, Member, MemberRole, validate_budget},
    },
    html::{base, form_error, format_currency},
    navigation::NavBar,
    user::UserId,
};

/// Display the settings page for a group.
///
/// Every member can see the invite code and member list; the budget form
/// and the delete section are only rendered for the group admin.
pub async fn get_group_settings_page(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let page = render_settings_page(group_id, user_id, None, &connection)?;

    Ok(page.into_response())
}

pub(super) fn render_settings_page(
    group_id: GroupId,
    user_id: UserId,
    budget_error: Option<&str>,
    connection: &Connection,
) -> Result<Markup, Error> {
    let member_role = get_membership_role(group_id, user_id, connection)?;
    let group = get_group(group_id, connection)?;
    let members = get_members(group_id, connection)?;

    Ok(settings_view(&group, &members, member_role, budget_error))
}

fn settings_view(
    group: &Group,
    members: &[Member],
    member_role: MemberRole,
    budget_error: Option<&str>,
) -> Markup {
    let is_admin = member_role == MemberRole::Admin;
    let expenses_url = endpoints::format_endpoint(endpoints::GROUP_EXPENSES_VIEW, group.id);
    let budget_url = endpoints::format_endpoint(endpoints::UPDATE_BUDGET, group.id);
    let delete_url = endpoints::format_endpoint(endpoints::DELETE_GROUP, group.id);

    let content = html! {
        (NavBar::new(endpoints::GROUPS_VIEW).into_html())

        main class="page"
        {
            header class="page-header"
            {
                h1 { (group.trip_name) " · Settings" }
                p class="subtitle"
                {
                    a href=(expenses_url) { "Back to expenses" }
                }
            }

            section class="form-card"
            {
                h2 { "Invite code" }
                p
                {
                    "Share this code with travel companions so they can join: "
                    strong class="invite-code" { (group.invite_code) }
                }
            }

            section class="form-card"
            {
                h2 { "Members" }
                ul class="member-list"
                {
                    @for member in members
                    {
                        li
                        {
                            (member.full_name)
                            " (" (member.email) ")"
                            @if member.role == MemberRole::Admin
                            {
                                span class="badge" { "admin" }
                            }
                        }
                    }
                }
            }

            @if is_admin
            {
                section class="form-card"
                {
                    h2 { "Budget" }
                    p
                    {
                        "Current total budget: " (format_currency(group.total_budget))
                    }

                    form method="post" action=(budget_url)
                    {
                        @if let Some(message) = budget_error
                        {
                            (form_error(message))
                        }

                        label for="total_budget" { "New total budget" }
                        input
                            type="number"
                            name="total_budget"
                            id="total_budget"
                            min="0.01"
                            step="0.01"
                            value=(format!("{:.2}", group.total_budget))
                            required;

                        button type="submit" class="button" { "Update budget" }
                    }
                }

                section class="form-card danger-zone"
                {
                    h2 { "Delete this trip" }
                    p
                    {
                        "Deleting removes the group, all its expenses and all \
                        memberships. This cannot be undone."
                    }

                    form method="post" action=(delete_url)
                    {
                        div class="form-row"
                        {
                            input type="checkbox" name="confirm" id="confirm" required;
                            label for="confirm" { "I understand, delete everything" }
                        }

                        button type="submit" class="button button-danger" { "Delete trip" }
                    }
                }
            }
        }
    };

    base(&format!("{} Settings", group.trip_name), &content)
}

/// The data entered into the budget form.
#[derive(Deserialize)]
pub struct UpdateBudgetForm {
    /// The new budget ceiling. Kept as a string so a non-numeric value
    /// renders a validation message instead of a 422.
    pub total_budget: String,
}

/// Handler for changing a group's total budget.
///
/// Group-admin only. The write is a plain overwrite: concurrent edits are
/// last-write-wins.
pub async fn update_budget_endpoint(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
    Form(form): Form<UpdateBudgetForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    if get_membership_role(group_id, user_id, &connection)? != MemberRole::Admin {
        return Err(Error::NotGroupAdmin);
    }

    let total_budget = match form
        .total_budget
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidBudget)
        .and_then(validate_budget)
    {
        Ok(total_budget) => total_budget,
        Err(error) => {
            let page =
                render_settings_page(group_id, user_id, Some(&error.to_string()), &connection)?;
            return Ok(page.into_response());
        }
    };

    update_budget(group_id, total_budget, &connection)?;
    tracing::info!("user {user_id} set group {group_id} budget to {total_budget:.2}");

    let settings_url = endpoints::format_endpoint(endpoints::GROUP_SETTINGS_VIEW, group_id);
    Ok(Redirect::to(&settings_url).into_response())
}

/// The confirmation checkbox for deleting a group.
#[derive(Deserialize)]
pub struct DeleteGroupForm {
    /// Present when the user ticked the confirmation checkbox.
    pub confirm: Option<String>,
}

/// Handler for deleting a group.
///
/// The admin check happens before any write, so a non-admin request removes
/// nothing. The cascade itself runs in one transaction.
pub async fn delete_group_endpoint(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
    Form(form): Form<DeleteGroupForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    if get_membership_role(group_id, user_id, &connection)? != MemberRole::Admin {
        return Err(Error::NotGroupAdmin);
    }

    if form.confirm.is_none() {
        let settings_url = endpoints::format_endpoint(endpoints::GROUP_SETTINGS_VIEW, group_id);
        return Ok(Redirect::to(&settings_url).into_response());
    }

    delete_group(group_id, &connection)?;
    tracing::info!("user {user_id} deleted group {group_id}");

    Ok(Redirect::to(endpoints::GROUPS_VIEW).into_response())
}

#[cfg(test)]
mod settings_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension, Form,
        extract::{Path, State},
    };
    use rusqlite::Connection;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        group::{
            GroupState,
            db::{create_group, get_group, join_group},
            domain::{Group, TripName},
        },
        user::{Role, User, create_user},
    };

    use super::{
        DeleteGroupForm, UpdateBudgetForm, delete_group_endpoint, update_budget_endpoint,
    };

    fn get_test_state() -> GroupState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        GroupState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn create_test_user(email: &str, state: &GroupState) -> User {
        let connection = state.db_connection.lock().unwrap();
        create_user(
            email,
            "Test Traveler",
            Role::User,
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user")
    }

    fn create_test_group(admin: &User, state: &GroupState) -> Group {
        let connection = state.db_connection.lock().unwrap();
        create_group(
            TripName::new_unchecked("Japan"),
            5000.0,
            admin.id,
            &connection,
        )
        .expect("Could not create test group")
    }

    #[tokio::test]
    async fn admin_can_update_budget() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", &state);
        let group = create_test_group(&admin, &state);

        update_budget_endpoint(
            State(state.clone()),
            Extension(admin.id),
            Path(group.id),
            Form(UpdateBudgetForm {
                total_budget: "6500".to_string(),
            }),
        )
        .await
        .expect("Handler returned an error");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_group(group.id, &connection).unwrap().total_budget, 6500.0);
    }

    #[tokio::test]
    async fn member_cannot_update_budget() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", &state);
        let member = create_test_user("ben@example.com", &state);
        let group = create_test_group(&admin, &state);
        {
            let connection = state.db_connection.lock().unwrap();
            join_group(group.id, member.id, &connection).unwrap();
        }

        let result = update_budget_endpoint(
            State(state.clone()),
            Extension(member.id),
            Path(group.id),
            Form(UpdateBudgetForm {
                total_budget: "1".to_string(),
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::NotGroupAdmin)));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_group(group.id, &connection).unwrap().total_budget, 5000.0);
    }

    #[tokio::test]
    async fn non_admin_delete_removes_nothing() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", &state);
        let member = create_test_user("ben@example.com", &state);
        let group = create_test_group(&admin, &state);
        {
            let connection = state.db_connection.lock().unwrap();
            join_group(group.id, member.id, &connection).unwrap();
        }

        let result = delete_group_endpoint(
            State(state.clone()),
            Extension(member.id),
            Path(group.id),
            Form(DeleteGroupForm {
                confirm: Some("on".to_string()),
            }),
        )
        .await;

        assert!(matches!(result, Err(Error::NotGroupAdmin)));
        let connection = state.db_connection.lock().unwrap();
        assert!(get_group(group.id, &connection).is_ok(), "group must survive");
    }

    #[tokio::test]
    async fn admin_delete_cascades() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", &state);
        let group = create_test_group(&admin, &state);

        let response = delete_group_endpoint(
            State(state.clone()),
            Extension(admin.id),
            Path(group.id),
            Form(DeleteGroupForm {
                confirm: Some("on".to_string()),
            }),
        )
        .await
        .expect("Handler returned an error");

        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_group(group.id, &connection), Err(Error::GroupNotFound));
    }

    #[tokio::test]
    async fn delete_without_confirmation_is_a_no_op() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", &state);
        let group = create_test_group(&admin, &state);

        delete_group_endpoint(
            State(state.clone()),
            Extension(admin.id),
            Path(group.id),
            Form(DeleteGroupForm { confirm: None }),
        )
        .await
        .expect("Handler returned an error");

        let connection = state.db_connection.lock().unwrap();
        assert!(get_group(group.id, &connection).is_ok());
    }
}
