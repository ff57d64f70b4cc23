//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/groups/{group_id}', use [format_endpoint].

/// The root route which redirects to the groups overview or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users, listing their trip groups.
pub const GROUPS_VIEW: &str = "/groups";
/// The dashboard page for a single trip group.
pub const GROUP_DASHBOARD_VIEW: &str = "/groups/{group_id}";
/// The page listing a group's expenses with filter and sort controls.
pub const GROUP_EXPENSES_VIEW: &str = "/groups/{group_id}/expenses";
/// The page for logging a new expense against a group.
pub const NEW_EXPENSE_VIEW: &str = "/groups/{group_id}/expenses/new";
/// The page for editing an existing expense.
pub const EDIT_EXPENSE_VIEW: &str = "/expenses/{expense_id}/edit";
/// The settings page for a group (budget, invite code, deletion).
pub const GROUP_SETTINGS_VIEW: &str = "/groups/{group_id}/settings";
/// The page for the personal (non-group) budget and its expenses.
pub const PERSONAL_BUDGET_VIEW: &str = "/budget";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route prefix for static assets such as the stylesheet.
pub const STATIC: &str = "/static";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to register an account.
pub const USERS: &str = "/api/users";
/// The route to create a group.
pub const CREATE_GROUP: &str = "/api/groups";
/// The route to join a group with an invite code.
pub const JOIN_GROUP: &str = "/api/groups/join";
/// The route to delete a group and everything in it.
pub const DELETE_GROUP: &str = "/api/groups/{group_id}/delete";
/// The route to change a group's total budget.
pub const UPDATE_BUDGET: &str = "/api/groups/{group_id}/budget";
/// The route to create an expense in a group.
pub const CREATE_EXPENSE: &str = "/api/groups/{group_id}/expenses";
/// The route to update an expense.
pub const UPDATE_EXPENSE: &str = "/api/expenses/{expense_id}";
/// The route to delete an expense.
pub const DELETE_EXPENSE: &str = "/api/expenses/{expense_id}/delete";
/// The route to save a named expense filter for a group.
pub const SAVE_FILTER: &str = "/api/groups/{group_id}/filters";
/// The route to delete a saved expense filter.
pub const DELETE_FILTER: &str = "/api/filters/{filter_id}/delete";
/// The route to download a group's trip log as a standalone HTML document.
pub const TRIP_LOG_EXPORT: &str = "/groups/{group_id}/export/trip_log";
/// The route to download a group's expenses as CSV.
pub const CSV_EXPORT: &str = "/groups/{group_id}/export/expenses";
/// The route to set the personal budget (once).
pub const SET_PERSONAL_BUDGET: &str = "/api/budget";
/// The route to log an expense against the personal budget.
pub const CREATE_PERSONAL_EXPENSE: &str = "/api/budget/expenses";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/groups/{group_id}', '{group_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}

// These tests are here so that we know when we call `Uri::from_shared` it will not panic.
#[cfg(test)]
mod endpoints_tests {
    use axum::http::Uri;

    use crate::endpoints;

    use super::format_endpoint;

    fn assert_endpoint_is_valid_uri(uri: &str) {
        assert!(uri.parse::<Uri>().is_ok());
    }

    #[test]
    fn endpoints_are_valid_uris() {
        assert_endpoint_is_valid_uri(endpoints::ROOT);
        assert_endpoint_is_valid_uri(endpoints::GROUPS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::GROUP_DASHBOARD_VIEW);
        assert_endpoint_is_valid_uri(endpoints::GROUP_EXPENSES_VIEW);
        assert_endpoint_is_valid_uri(endpoints::NEW_EXPENSE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::EDIT_EXPENSE_VIEW);
        assert_endpoint_is_valid_uri(endpoints::GROUP_SETTINGS_VIEW);
        assert_endpoint_is_valid_uri(endpoints::PERSONAL_BUDGET_VIEW);
        assert_endpoint_is_valid_uri(endpoints::REGISTER_VIEW);
        assert_endpoint_is_valid_uri(endpoints::LOG_IN_VIEW);
        assert_endpoint_is_valid_uri(endpoints::STATIC);
        assert_endpoint_is_valid_uri(endpoints::INTERNAL_ERROR_VIEW);

        assert_endpoint_is_valid_uri(endpoints::LOG_IN_API);
        assert_endpoint_is_valid_uri(endpoints::LOG_OUT);
        assert_endpoint_is_valid_uri(endpoints::USERS);
        assert_endpoint_is_valid_uri(endpoints::CREATE_GROUP);
        assert_endpoint_is_valid_uri(endpoints::JOIN_GROUP);
        assert_endpoint_is_valid_uri(endpoints::DELETE_GROUP);
        assert_endpoint_is_valid_uri(endpoints::UPDATE_BUDGET);
        assert_endpoint_is_valid_uri(endpoints::CREATE_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::UPDATE_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::DELETE_EXPENSE);
        assert_endpoint_is_valid_uri(endpoints::SAVE_FILTER);
        assert_endpoint_is_valid_uri(endpoints::DELETE_FILTER);
        assert_endpoint_is_valid_uri(endpoints::TRIP_LOG_EXPORT);
        assert_endpoint_is_valid_uri(endpoints::CSV_EXPORT);
        assert_endpoint_is_valid_uri(endpoints::SET_PERSONAL_BUDGET);
        assert_endpoint_is_valid_uri(endpoints::CREATE_PERSONAL_EXPENSE);
    }

    #[test]
    fn produces_valid_uri() {
        let formatted_path = format_endpoint("/hello/{world_id}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());

        // Parameter with single word should also work.
        let formatted_path = format_endpoint("/hello/{world}", 1);

        assert_eq!(formatted_path, "/hello/1");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn returns_original_path_with_no_parameter() {
        let formatted_path = format_endpoint("/hello/world", 1);

        assert_eq!(formatted_path, "/hello/world");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }

    #[test]
    fn parameter_in_middle() {
        let formatted_path = format_endpoint("/hello/{world}/bye", 1);

        assert_eq!(formatted_path, "/hello/1/bye");
        assert!(formatted_path.parse::<Uri>().is_ok());
    }
}
