//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router, middleware,
    response::Redirect,
    routing::{get, post},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    auth::{
        auth_guard, get_log_in_page, get_log_out, get_register_page, post_log_in, register_user,
    },
    budget::{
        create_personal_expense_endpoint, get_personal_budget_page, set_personal_budget_endpoint,
    },
    custom_filter::{delete_filter_endpoint, save_filter_endpoint},
    dashboard::get_group_dashboard_page,
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, get_edit_expense_page,
        get_group_expenses_page, get_new_expense_page, update_expense_endpoint,
    },
    group::{
        create_group_endpoint, delete_group_endpoint, get_group_settings_page, get_groups_page,
        join_group_endpoint, update_budget_endpoint,
    },
    internal_server_error::get_internal_server_error_page,
    not_found::get_404_not_found,
    report::{download_expenses_csv, download_trip_log},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::GROUPS_VIEW, get(get_groups_page))
        .route(endpoints::CREATE_GROUP, post(create_group_endpoint))
        .route(endpoints::JOIN_GROUP, post(join_group_endpoint))
        .route(endpoints::GROUP_DASHBOARD_VIEW, get(get_group_dashboard_page))
        .route(endpoints::GROUP_SETTINGS_VIEW, get(get_group_settings_page))
        .route(endpoints::UPDATE_BUDGET, post(update_budget_endpoint))
        .route(endpoints::DELETE_GROUP, post(delete_group_endpoint))
        .route(endpoints::GROUP_EXPENSES_VIEW, get(get_group_expenses_page))
        .route(endpoints::NEW_EXPENSE_VIEW, get(get_new_expense_page))
        .route(endpoints::CREATE_EXPENSE, post(create_expense_endpoint))
        .route(endpoints::EDIT_EXPENSE_VIEW, get(get_edit_expense_page))
        .route(endpoints::UPDATE_EXPENSE, post(update_expense_endpoint))
        .route(endpoints::DELETE_EXPENSE, post(delete_expense_endpoint))
        .route(endpoints::SAVE_FILTER, post(save_filter_endpoint))
        .route(endpoints::DELETE_FILTER, post(delete_filter_endpoint))
        .route(endpoints::TRIP_LOG_EXPORT, get(download_trip_log))
        .route(endpoints::CSV_EXPORT, get(download_expenses_csv))
        .route(endpoints::PERSONAL_BUDGET_VIEW, get(get_personal_budget_page))
        .route(
            endpoints::SET_PERSONAL_BUDGET,
            post(set_personal_budget_endpoint),
        )
        .route(
            endpoints::CREATE_PERSONAL_EXPENSE,
            post(create_personal_expense_endpoint),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the groups overview.
///
/// Signed-out visitors never reach this handler; the auth guard redirects
/// them to the log-in page first.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::GROUPS_VIEW)
}
