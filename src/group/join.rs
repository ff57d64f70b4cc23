//! Route handler for joining a trip group with an invite code.

use axum::{
    Extension, Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    Error, endpoints,
    group::{
        GroupState,
        db::{get_group_by_invite_code, get_membership_role, join_group},
        domain::InviteCode,
        list::render_groups_page,
    },
    user::UserId,
};

/// The data entered into the join-trip form.
#[derive(Deserialize)]
pub struct JoinGroupForm {
    /// The invite code, in whatever case the user typed it.
    pub invite_code: String,
}

/// Handler for joining a group.
///
/// Checks run in order: the code resolves to a group, the group is active,
/// the caller is not already a member. The first failing check decides the
/// message shown. On success the client is redirected to the group's
/// dashboard.
pub async fn join_group_endpoint(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<JoinGroupForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let render_error = |message: &str| {
        render_groups_page(user_id, None, Some(message), &connection)
            .map(|page| page.into_response())
    };

    let invite_code = match InviteCode::parse(&form.invite_code) {
        Ok(invite_code) => invite_code,
        Err(error) => return render_error(&error.to_string()),
    };

    let group = match get_group_by_invite_code(&invite_code, &connection) {
        Ok(group) => group,
        Err(Error::GroupNotFound) => {
            return render_error("Group not found. Double-check the invite code.");
        }
        Err(error) => return Err(error),
    };

    if !group.is_active {
        return render_error("This group is no longer active.");
    }

    if get_membership_role(group.id, user_id, &connection).is_ok() {
        return render_error("You are already a member of this group.");
    }

    join_group(group.id, user_id, &connection)?;
    tracing::info!("user {user_id} joined group {}", group.id);

    let dashboard_url = endpoints::format_endpoint(endpoints::GROUP_DASHBOARD_VIEW, group.id);
    Ok(Redirect::to(&dashboard_url).into_response())
}
