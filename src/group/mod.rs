//! Trip groups: the shared container for a trip's budget, members and
//! expenses. Covers the group lifecycle (create, join, delete), budget
//! edits and the pages for listing groups and managing a group.

mod create;
mod db;
mod domain;
mod join;
mod list;
mod settings;

pub use create::create_group_endpoint;
pub use db::{
    add_custom_category, create_group, create_group_tables, delete_group, get_group,
    get_group_by_invite_code, get_members, get_membership_role, get_user_groups, join_group,
    update_budget,
};
pub use domain::{
    DEFAULT_CATEGORIES, Group, GroupId, InviteCode, Member, MemberRole, TripName, validate_budget,
};
pub use join::join_group_endpoint;
pub use list::get_groups_page;
pub use settings::{delete_group_endpoint, get_group_settings_page, update_budget_endpoint};

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

/// The state needed by the group pages and endpoints.
#[derive(Clone)]
pub struct GroupState {
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GroupState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
