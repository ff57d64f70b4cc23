//! Route handler for creating a trip group.

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
        db::create_group,
        domain::{TripName, validate_budget},
        list::render_groups_page,
    },
    user::{UserId, get_user_by_id},
};

/// The data entered into the create-trip form.
#[derive(Deserialize)]
pub struct CreateGroupForm {
    /// The name of the trip.
    pub trip_name: String,
    /// The shared budget ceiling. Kept as a string so a non-numeric value
    /// renders a validation message instead of a 422.
    pub total_budget: String,
}

/// Handler for creating a group.
///
/// The creator becomes the group admin and its sole initial member. On
/// success the client is redirected to the new group's dashboard.
pub async fn create_group_endpoint(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserId>,
    Form(form): Form<CreateGroupForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let render_error = |message: &str| {
        render_groups_page(user_id, Some(message), None, &connection)
            .map(|page| page.into_response())
    };

    let user = get_user_by_id(user_id, &connection)?;
    if !user.role.capabilities().can_edit {
        return render_error("Your account role does not allow creating trips.");
    }

    let trip_name = match TripName::new(&form.trip_name) {
        Ok(trip_name) => trip_name,
        Err(error) => return render_error(&error.to_string()),
    };

    let total_budget = match form
        .total_budget
        .trim()
        .parse::<f64>()
        .map_err(|_| Error::InvalidBudget)
        .and_then(validate_budget)
    {
        Ok(total_budget) => total_budget,
        Err(error) => return render_error(&error.to_string()),
    };

    match create_group(trip_name, total_budget, user_id, &connection) {
        Ok(group) => {
            tracing::info!("user {user_id} created group {}", group.id);
            let dashboard_url =
                endpoints::format_endpoint(endpoints::GROUP_DASHBOARD_VIEW, group.id);
            Ok(Redirect::to(&dashboard_url).into_response())
        }
        Err(Error::DuplicateInviteCode) => {
            // The 36^8 code space makes this a freak occurrence; asking the
            // user to resubmit generates a fresh code.
            render_error("Could not generate a unique invite code. Please try again.")
        }
        Err(error) => Err(error),
    }
}
