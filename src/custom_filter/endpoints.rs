//! Route handlers for saving and deleting named expense filters.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::Form;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    custom_filter::db::{SavedFilterConfig, SavedFilterId, delete_filter, save_filter},
    endpoints,
    group::{GroupId, get_membership_role},
    user::UserId,
};

/// The state needed by the saved filter endpoints.
#[derive(Clone)]
pub struct SavedFilterState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for SavedFilterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The data submitted by the save-filter form: a name plus the filter
/// fields currently applied on the expenses page.
#[derive(Deserialize)]
pub struct SaveFilterForm {
    /// The name for the new saved filter.
    pub name: String,
    /// Selected category names.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Selected member user IDs.
    #[serde(default)]
    pub users: Vec<i64>,
    /// Start of the date range.
    #[serde(default)]
    pub date_from: Option<String>,
    /// End of the date range.
    #[serde(default)]
    pub date_to: Option<String>,
    /// Minimum amount.
    #[serde(default)]
    pub amount_min: Option<String>,
    /// Maximum amount.
    #[serde(default)]
    pub amount_max: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

/// Handler for saving a named filter for the current group.
///
/// Redirects back to the expenses page with the new filter applied. A
/// duplicate name redirects back without saving; the name stays unique per
/// user.
pub async fn save_filter_endpoint(
    State(state): State<SavedFilterState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
    Form(form): Form<SaveFilterForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    get_membership_role(group_id, user_id, &connection)?;

    let expenses_url = endpoints::format_endpoint(endpoints::GROUP_EXPENSES_VIEW, group_id);

    let name = form.name.trim().to_string();
    if name.is_empty() {
        return Ok(Redirect::to(&expenses_url).into_response());
    }

    let config = SavedFilterConfig {
        categories: form.categories,
        users: form.users,
        date_from: non_empty(form.date_from),
        date_to: non_empty(form.date_to),
        amount_min: non_empty(form.amount_min).and_then(|text| text.parse().ok()),
        amount_max: non_empty(form.amount_max).and_then(|text| text.parse().ok()),
    };

    match save_filter(user_id, group_id, &name, &config, &connection) {
        Ok(saved) => {
            Ok(Redirect::to(&format!("{expenses_url}?filter={}", saved.id)).into_response())
        }
        Err(Error::DuplicateFilterName(_)) => {
            // The page links saved filters by name; a silent overwrite would
            // be surprising, so the duplicate is simply not saved.
            Ok(Redirect::to(&expenses_url).into_response())
        }
        Err(error) => Err(error),
    }
}

/// The form accompanying a delete-filter button.
#[derive(Deserialize)]
pub struct DeleteFilterForm {
    /// The group whose expenses page to return to.
    pub group_id: GroupId,
}

/// Handler for deleting one of the caller's saved filters.
pub async fn delete_filter_endpoint(
    State(state): State<SavedFilterState>,
    Extension(user_id): Extension<UserId>,
    Path(filter_id): Path<SavedFilterId>,
    Form(form): Form<DeleteFilterForm>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_filter(filter_id, user_id, &connection) {
        // Deleting an already-gone filter just refreshes the page.
        Ok(()) | Err(Error::DeleteMissingFilter) => {}
        Err(error) => return Err(error),
    }

    let expenses_url = endpoints::format_endpoint(endpoints::GROUP_EXPENSES_VIEW, form.group_id);
    Ok(Redirect::to(&expenses_url).into_response())
}

#[cfg(test)]
mod saved_filter_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Extension,
        extract::{Path, State},
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;

    use crate::{
        PasswordHash,
        custom_filter::db::get_user_filters,
        db::initialize,
        group::{Group, TripName, create_group},
        user::{Role, User, create_user},
    };

    use super::{
        DeleteFilterForm, SaveFilterForm, SavedFilterState, delete_filter_endpoint,
        save_filter_endpoint,
    };

    fn get_test_state() -> SavedFilterState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        SavedFilterState {
            db_connection: Arc::new(Mutex::new(conn)),
        }
    }

    fn create_test_user(state: &SavedFilterState) -> User {
        let connection = state.db_connection.lock().unwrap();
        create_user(
            "ana@example.com",
            "Ana Traveler",
            Role::User,
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .expect("Could not create test user")
    }

    fn create_test_group(admin: &User, state: &SavedFilterState) -> Group {
        let connection = state.db_connection.lock().unwrap();
        create_group(
            TripName::new_unchecked("Japan"),
            5000.0,
            admin.id,
            &connection,
        )
        .expect("Could not create test group")
    }

    fn sample_form(name: &str) -> SaveFilterForm {
        SaveFilterForm {
            name: name.to_string(),
            categories: vec!["Food".to_string()],
            users: vec![],
            date_from: Some("2026-03-01".to_string()),
            date_to: None,
            amount_min: Some("10".to_string()),
            amount_max: Some(String::new()),
        }
    }

    #[tokio::test]
    async fn save_filter_persists_and_redirects_with_filter_applied() {
        let state = get_test_state();
        let user = create_test_user(&state);
        let group = create_test_group(&user, &state);

        let response = save_filter_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(group.id),
            Form(sample_form("Food only")),
        )
        .await
        .expect("Handler returned an error");

        assert_eq!(response.status(), axum::http::StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let filters = get_user_filters(user.id, group.id, &connection).unwrap();
        assert_eq!(filters.len(), 1);
        assert_eq!(filters[0].name, "Food only");
        assert_eq!(filters[0].config.amount_min, Some(10.0));
        assert_eq!(filters[0].config.amount_max, None);
    }

    #[tokio::test]
    async fn duplicate_filter_name_is_not_saved_twice() {
        let state = get_test_state();
        let user = create_test_user(&state);
        let group = create_test_group(&user, &state);

        save_filter_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(group.id),
            Form(sample_form("Mine")),
        )
        .await
        .unwrap();
        save_filter_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(group.id),
            Form(sample_form("Mine")),
        )
        .await
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_user_filters(user.id, group.id, &connection).unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn delete_filter_endpoint_removes_filter() {
        let state = get_test_state();
        let user = create_test_user(&state);
        let group = create_test_group(&user, &state);

        save_filter_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(group.id),
            Form(sample_form("Mine")),
        )
        .await
        .unwrap();

        let filter_id = {
            let connection = state.db_connection.lock().unwrap();
            get_user_filters(user.id, group.id, &connection).unwrap()[0].id
        };

        delete_filter_endpoint(
            State(state.clone()),
            Extension(user.id),
            Path(filter_id),
            Form(DeleteFilterForm { group_id: group.id }),
        )
        .await
        .expect("Handler returned an error");

        let connection = state.db_connection.lock().unwrap();
        assert!(get_user_filters(user.id, group.id, &connection).unwrap().is_empty());
    }
}
