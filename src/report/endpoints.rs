//! Download handlers for the trip-log HTML document and the CSV export.

use std::sync::{Arc, Mutex};

use axum::{
    Extension,
    extract::{FromRef, Path, State},
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    expense::{SortKey, SortOrder, get_group_expense_records, sort_expenses},
    group::{GroupId, get_membership_role},
    report::{
        build_trip_log,
        csv::{csv_filename, expenses_csv, trip_log_filename},
        html::render_trip_log_html,
    },
    timezone::local_date,
    user::{UserId, get_user_by_id},
};

/// The state needed by the download handlers.
#[derive(Clone)]
pub struct ReportState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// Export file names embed the date the report was generated, stamped in
    /// this timezone.
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Handler that downloads a group's trip log as a standalone HTML document.
///
/// Requires group membership and the export capability.
pub async fn download_trip_log(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    check_export_allowed(group_id, user_id, &connection)?;

    let generated_on = local_date(&state.local_timezone);
    let trip_log = build_trip_log(group_id, generated_on, &connection)?;
    let document = render_trip_log_html(&trip_log);
    let filename = trip_log_filename(trip_log.group.trip_name.as_ref(), generated_on);

    tracing::info!("user {user_id} exported the trip log for group {group_id}");

    Ok(download_response(document, "text/html; charset=utf-8", &filename))
}

/// Handler that downloads a group's expenses as CSV.
///
/// The rows are chronological, matching the trip-log ledger rather than the
/// newest-first order of the interactive expense page.
pub async fn download_expenses_csv(
    State(state): State<ReportState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    check_export_allowed(group_id, user_id, &connection)?;

    let mut records = get_group_expense_records(group_id, &connection)?;
    sort_expenses(&mut records, SortKey::ExpenseDate, SortOrder::Ascending);

    let csv_text = expenses_csv(&records)?;
    let generated_on = local_date(&state.local_timezone);
    let filename = csv_filename(generated_on);

    tracing::info!("user {user_id} exported the expense CSV for group {group_id}");

    Ok(download_response(csv_text, "text/csv; charset=utf-8", &filename))
}

/// Exports require membership of the group and an account role with the
/// export capability.
fn check_export_allowed(
    group_id: GroupId,
    user_id: UserId,
    connection: &Connection,
) -> Result<(), Error> {
    get_membership_role(group_id, user_id, connection)?;

    let user = get_user_by_id(user_id, connection)?;
    if !user.role.capabilities().can_export {
        return Err(Error::PermissionDenied);
    }

    Ok(())
}

fn download_response(body: String, content_type: &'static str, filename: &str) -> Response {
    (
        [
            (CONTENT_TYPE, content_type.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod download_tests {
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

    use super::{ReportState, download_expenses_csv, download_trip_log};

    fn get_test_state() -> ReportState {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();

        ReportState {
            db_connection: Arc::new(Mutex::new(conn)),
            local_timezone: "Etc/UTC".to_string(),
        }
    }

    fn create_test_user(email: &str, role: Role, state: &ReportState) -> User {
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

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8_lossy(&bytes).to_string()
    }

    #[tokio::test]
    async fn trip_log_download_is_an_html_attachment() {
        let state = get_test_state();
        let user = create_test_user("ana@example.com", Role::User, &state);
        let group = {
            let connection = state.db_connection.lock().unwrap();
            let group = create_group(
                TripName::new_unchecked("Japan 2026"),
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
            group
        };

        let response = download_trip_log(State(state), Extension(user.id), Path(group.id))
            .await
            .expect("Handler returned an error");

        let disposition = response
            .headers()
            .get("content-disposition")
            .expect("missing content-disposition header")
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.starts_with("attachment; filename=\"trip-log-Japan-2026-"));
        assert!(disposition.ends_with(".html\""));

        let body = body_text(response).await;
        assert!(body.contains("<!DOCTYPE html>"));
        assert!(body.contains("$45.50"));
    }

    #[tokio::test]
    async fn csv_download_has_the_export_header_row() {
        let state = get_test_state();
        let user = create_test_user("ana@example.com", Role::User, &state);
        let group = {
            let connection = state.db_connection.lock().unwrap();
            create_group(
                TripName::new_unchecked("Japan"),
                1000.0,
                user.id,
                &connection,
            )
            .unwrap()
        };

        let response = download_expenses_csv(State(state), Extension(user.id), Path(group.id))
            .await
            .expect("Handler returned an error");

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "text/csv; charset=utf-8"
        );

        let body = body_text(response).await;
        assert!(
            body.starts_with("\"Date\",\"Member\",\"Email\",\"Category\",\"Description\",\"Amount\"")
        );
    }

    #[tokio::test]
    async fn viewer_cannot_export() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", Role::User, &state);
        let viewer = create_test_user("guest@example.com", Role::Viewer, &state);
        let group = {
            let connection = state.db_connection.lock().unwrap();
            let group = create_group(
                TripName::new_unchecked("Japan"),
                1000.0,
                admin.id,
                &connection,
            )
            .unwrap();
            crate::group::join_group(group.id, viewer.id, &connection).unwrap();
            group
        };

        let result = download_trip_log(State(state), Extension(viewer.id), Path(group.id)).await;

        assert!(matches!(result, Err(Error::PermissionDenied)));
    }

    #[tokio::test]
    async fn non_member_cannot_export() {
        let state = get_test_state();
        let admin = create_test_user("ana@example.com", Role::User, &state);
        let outsider = create_test_user("mallory@example.com", Role::User, &state);
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
            download_expenses_csv(State(state), Extension(outsider.id), Path(group.id)).await;

        assert!(matches!(result, Err(Error::NotGroupMember)));
    }
}
