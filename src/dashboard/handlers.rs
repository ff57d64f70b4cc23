//! Dashboard HTTP handler and view rendering.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    dashboard::{
        DashboardState,
        cards::{BudgetSummary, budget_cards_view},
        tables::{category_breakdown_table, member_breakdown_table},
    },
    endpoints,
    expense::get_group_expense_records,
    group::{Group, GroupId, get_group, get_members, get_membership_role},
    html::base,
    navigation::NavBar,
    stats::{budget_progress, by_category, by_user, remaining, total_of},
    user::{UserId, get_user_by_id},
};

/// Display a group's dashboard: the budget summary and breakdowns.
pub async fn get_group_dashboard_page(
    State(state): State<DashboardState>,
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
    let records = get_group_expense_records(group_id, &connection)?;
    let members = get_members(group_id, &connection)?;
    let user = get_user_by_id(user_id, &connection)?;

    let summary = BudgetSummary {
        total_budget: group.total_budget,
        total_spent: total_of(&records),
        remaining: remaining(group.total_budget, &records),
        progress: budget_progress(group.total_budget, &records),
        member_count: members.len(),
        expense_count: records.len(),
    };
    let category_breakdown = by_category(&records, group.total_budget);
    let member_breakdown = by_user(&records);

    let page = dashboard_view(
        &group,
        &summary,
        &category_breakdown,
        &member_breakdown,
        user.role.capabilities().can_export,
    );

    Ok(page.into_response())
}

fn dashboard_view(
    group: &Group,
    summary: &BudgetSummary,
    category_breakdown: &[crate::stats::CategoryTotal],
    member_breakdown: &[crate::stats::MemberSpending],
    can_export: bool,
) -> Markup {
    let expenses_url = endpoints::format_endpoint(endpoints::GROUP_EXPENSES_VIEW, group.id);
    let settings_url = endpoints::format_endpoint(endpoints::GROUP_SETTINGS_VIEW, group.id);
    let trip_log_url = endpoints::format_endpoint(endpoints::TRIP_LOG_EXPORT, group.id);
    let csv_url = endpoints::format_endpoint(endpoints::CSV_EXPORT, group.id);

    let content = html! {
        (NavBar::new(endpoints::GROUPS_VIEW).into_html())

        main class="page"
        {
            header class="page-header"
            {
                h1 { (group.trip_name) }
                p class="subtitle"
                {
                    a href=(expenses_url) { "Expenses" }
                    " · "
                    a href=(settings_url) { "Settings" }
                    @if can_export
                    {
                        " · "
                        a href=(trip_log_url) { "Download trip log" }
                        " · "
                        a href=(csv_url) { "Export CSV" }
                    }
                }
            }

            (budget_cards_view(summary))

            @if summary.expense_count == 0
            {
                p class="empty-state"
                {
                    "Nothing spent yet. "
                    a href=(endpoints::format_endpoint(endpoints::NEW_EXPENSE_VIEW, group.id))
                    {
                        "Log the first expense"
                    }
                }
            }
            @else
            {
                div class="table-columns"
                {
                    (category_breakdown_table(category_breakdown))
                    (member_breakdown_table(member_breakdown))
                }
            }
        }
    };

    base(group.trip_name.as_ref(), &content)
}

#[cfg(test)]
mod dashboard_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error, PasswordHash,
        db::initialize,
        expense::{ExpenseDraft, create_expense},
        group::{TripName, create_group},
        user::{Role, User, create_user},
    };

    use super::{DashboardState, get_group_dashboard_page};

    fn get_test_state() -> DashboardState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        DashboardState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn create_test_user(email: &str, state: &DashboardState) -> User {
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

    #[tokio::test]
    async fn dashboard_renders_budget_figures() {
        let state = get_test_state();
        let user = create_test_user("ana@example.com", &state);
        let group = {
            let connection = state.db_connection.lock().unwrap();
            let group = create_group(
                TripName::new_unchecked("Japan"),
                1000.0,
                user.id,
                &connection,
            )
            .unwrap();
            create_expense(
                ExpenseDraft::new(45.5, "Cafe", "Food", date!(2026 - 03 - 01)).unwrap(),
                Some(group.id),
                user.id,
                &connection,
            )
            .unwrap();
            create_expense(
                ExpenseDraft::new(22.0, "Taxi", "Transport", date!(2026 - 03 - 02)).unwrap(),
                Some(group.id),
                user.id,
                &connection,
            )
            .unwrap();
            group
        };

        let response =
            get_group_dashboard_page(State(state), Extension(user.id), Path(group.id))
                .await
                .expect("Handler returned an error");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8_lossy(&body);

        assert!(text.contains("$1,000.00"), "total budget should be shown");
        assert!(text.contains("$67.50"), "total spent should be shown");
        assert!(text.contains("$932.50"), "remaining should be shown");
        assert!(text.contains("Food"), "category breakdown should be shown");
    }

    #[tokio::test]
    async fn non_member_gets_not_found() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", &state);
        let outsider = create_test_user("mallory@example.com", &state);
        let group = {
            let connection = state.db_connection.lock().unwrap();
            create_group(
                TripName::new_unchecked("Japan"),
                1000.0,
                admin.id,
                &connection,
            )
            .unwrap()
        };

        let result =
            get_group_dashboard_page(State(state), Extension(outsider.id), Path(group.id)).await;

        assert!(matches!(result, Err(Error::NotGroupMember)));
    }
}
