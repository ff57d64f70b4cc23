//! Saved expense filters: a named combination of category, member, date and
//! amount predicates a user can re-apply on a group's expense page.

mod db;
mod endpoints;

pub use db::{
    SavedFilter, SavedFilterConfig, SavedFilterId, create_saved_filter_table, delete_filter,
    get_filter, get_user_filters, save_filter,
};
pub use endpoints::{SavedFilterState, delete_filter_endpoint, save_filter_endpoint};
