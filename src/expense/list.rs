//! The group expenses page: a filterable, sortable ledger of everything the
//! group has spent.

use std::collections::HashSet;

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{
    Error, endpoints,
    expense::{
        ExpenseState,
        db::get_group_expense_records,
        domain::ExpenseRecord,
        filter::{ExpenseFilter, SortKey, SortOrder, filter_expenses, sort_expenses},
    },
    custom_filter::{SavedFilter, get_filter, get_user_filters},
    group::{Group, GroupId, MemberRole, get_group, get_membership_role},
    html::{base, format_currency},
    navigation::NavBar,
    stats::total_of,
    user::UserId,
};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// The filter and sort controls submitted by the expenses page.
///
/// Everything is optional; string fields tolerate the empty values that
/// unfilled form inputs submit.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExpensesQuery {
    /// Free-text search.
    #[serde(default)]
    pub search: Option<String>,
    /// Selected category checkboxes.
    #[serde(default)]
    pub categories: Vec<String>,
    /// Selected member checkboxes.
    #[serde(default)]
    pub users: Vec<i64>,
    /// Start of the date range, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_from: Option<String>,
    /// End of the date range, `YYYY-MM-DD`.
    #[serde(default)]
    pub date_to: Option<String>,
    /// Minimum amount.
    #[serde(default)]
    pub amount_min: Option<String>,
    /// Maximum amount.
    #[serde(default)]
    pub amount_max: Option<String>,
    /// Sort column: `date`, `amount` or `logged`.
    #[serde(default)]
    pub sort: Option<String>,
    /// Sort direction: `asc` or `desc`.
    #[serde(default)]
    pub order: Option<String>,
    /// A saved filter to apply instead of the individual fields.
    #[serde(default)]
    pub filter: Option<i64>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

impl ExpensesQuery {
    /// Build the in-memory predicate set from the submitted fields.
    ///
    /// Unparsable dates and amounts are treated as unset rather than
    /// failing the page.
    pub fn to_filter(&self) -> ExpenseFilter {
        let parse_date = |raw: &Option<String>| {
            non_empty(raw).and_then(|text| Date::parse(&text, DATE_FORMAT).ok())
        };
        let parse_amount =
            |raw: &Option<String>| non_empty(raw).and_then(|text| text.parse::<f64>().ok());

        ExpenseFilter {
            search: non_empty(&self.search),
            categories: if self.categories.is_empty() {
                None
            } else {
                Some(self.categories.iter().cloned().collect::<HashSet<_>>())
            },
            users: if self.users.is_empty() {
                None
            } else {
                Some(self.users.iter().copied().collect::<HashSet<_>>())
            },
            date_from: parse_date(&self.date_from),
            date_to: parse_date(&self.date_to),
            amount_min: parse_amount(&self.amount_min),
            amount_max: parse_amount(&self.amount_max),
        }
    }

    /// The sort column, defaulting to the expense date.
    pub fn sort_key(&self) -> SortKey {
        match self.sort.as_deref() {
            Some("amount") => SortKey::Amount,
            Some("logged") => SortKey::CreatedAt,
            _ => SortKey::ExpenseDate,
        }
    }

    /// The sort direction, defaulting to newest first.
    pub fn sort_order(&self) -> SortOrder {
        match self.order.as_deref() {
            Some("asc") => SortOrder::Ascending,
            _ => SortOrder::Descending,
        }
    }

    /// Serialize the query back into a query string, overriding the sort
    /// column and direction. Used for the sortable column header links.
    fn query_string_with_sort(&self, sort: &str, order: &str) -> String {
        let mut pairs: Vec<(&str, String)> = Vec::new();

        if let Some(search) = non_empty(&self.search) {
            pairs.push(("search", search));
        }
        for category in &self.categories {
            pairs.push(("categories", category.clone()));
        }
        for user in &self.users {
            pairs.push(("users", user.to_string()));
        }
        if let Some(date_from) = non_empty(&self.date_from) {
            pairs.push(("date_from", date_from));
        }
        if let Some(date_to) = non_empty(&self.date_to) {
            pairs.push(("date_to", date_to));
        }
        if let Some(amount_min) = non_empty(&self.amount_min) {
            pairs.push(("amount_min", amount_min));
        }
        if let Some(amount_max) = non_empty(&self.amount_max) {
            pairs.push(("amount_max", amount_max));
        }
        if let Some(filter) = self.filter {
            pairs.push(("filter", filter.to_string()));
        }
        pairs.push(("sort", sort.to_string()));
        pairs.push(("order", order.to_string()));

        serde_urlencoded::to_string(&pairs).unwrap_or_default()
    }
}

/// Display a group's expenses with the submitted filters applied.
pub async fn get_group_expenses_page(
    State(state): State<ExpenseState>,
    Extension(user_id): Extension<UserId>,
    Path(group_id): Path<GroupId>,
    Query(query): Query<ExpensesQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let member_role = get_membership_role(group_id, user_id, &connection)?;
    let group = get_group(group_id, &connection)?;
    let records = get_group_expense_records(group_id, &connection)?;
    let saved_filters = get_user_filters(user_id, group_id, &connection)?;

    // A saved filter replaces the individual fields but the free-text
    // search still composes with it.
    let filter = match query.filter {
        Some(filter_id) => match get_filter(filter_id, user_id, &connection) {
            Ok(saved) => {
                let mut filter = saved.config.to_filter();
                filter.search = non_empty(&query.search);
                filter
            }
            Err(Error::NotFound) => query.to_filter(),
            Err(error) => return Err(error),
        },
        None => query.to_filter(),
    };

    let mut filtered = filter_expenses(&records, &filter);
    sort_expenses(&mut filtered, query.sort_key(), query.sort_order());

    let page = expenses_view(
        &group,
        &records,
        &filtered,
        &saved_filters,
        &query,
        user_id,
        member_role,
    );

    Ok(page.into_response())
}

#[allow(clippy::too_many_arguments)]
fn expenses_view(
    group: &Group,
    all_records: &[ExpenseRecord],
    filtered: &[ExpenseRecord],
    saved_filters: &[SavedFilter],
    query: &ExpensesQuery,
    user_id: UserId,
    member_role: MemberRole,
) -> Markup {
    let expenses_url = endpoints::format_endpoint(endpoints::GROUP_EXPENSES_VIEW, group.id);
    let dashboard_url = endpoints::format_endpoint(endpoints::GROUP_DASHBOARD_VIEW, group.id);
    let new_expense_url = endpoints::format_endpoint(endpoints::NEW_EXPENSE_VIEW, group.id);
    let save_filter_url = endpoints::format_endpoint(endpoints::SAVE_FILTER, group.id);

    let members: Vec<(i64, &str)> = {
        // Offer one checkbox per member that has logged anything.
        let mut seen = HashSet::new();
        all_records
            .iter()
            .filter(|record| seen.insert(record.user_id.as_i64()))
            .map(|record| (record.user_id.as_i64(), record.paid_by_name.as_str()))
            .collect()
    };

    let sort_link = |label: &str, sort: &str| -> Markup {
        // Clicking the active column flips the direction.
        let next_order = if query.sort.as_deref() == Some(sort)
            || (sort == "date" && query.sort.is_none())
        {
            match query.sort_order() {
                SortOrder::Descending => "asc",
                SortOrder::Ascending => "desc",
            }
        } else {
            "desc"
        };
        let href = format!(
            "{}?{}",
            expenses_url,
            query.query_string_with_sort(sort, next_order)
        );

        html!( a href=(href) { (label) } )
    };

    let content = html! {
        (NavBar::new(endpoints::GROUPS_VIEW).into_html())

        main class="page"
        {
            header class="page-header"
            {
                h1 { (group.trip_name) " · Expenses" }
                p class="subtitle"
                {
                    a href=(dashboard_url) { "Dashboard" }
                    " · "
                    a href=(endpoints::format_endpoint(endpoints::GROUP_SETTINGS_VIEW, group.id))
                    {
                        "Settings"
                    }
                    " · "
                    a href=(new_expense_url) { "Log an expense" }
                }
            }

            section class="form-card"
            {
                h2 { "Filters" }

                form method="get" action=(expenses_url)
                {
                    label for="search" { "Search" }
                    input
                        type="search"
                        name="search"
                        id="search"
                        value=[non_empty(&query.search)]
                        placeholder="Description, category or member";

                    fieldset
                    {
                        legend { "Categories" }
                        @for category in group.categories()
                        {
                            label class="checkbox-label"
                            {
                                input
                                    type="checkbox"
                                    name="categories"
                                    value=(category)
                                    checked[query.categories.contains(&category)];
                                (category)
                            }
                        }
                    }

                    fieldset
                    {
                        legend { "Members" }
                        @for (member_id, member_name) in &members
                        {
                            label class="checkbox-label"
                            {
                                input
                                    type="checkbox"
                                    name="users"
                                    value=(member_id)
                                    checked[query.users.contains(member_id)];
                                (member_name)
                            }
                        }
                    }

                    div class="form-row"
                    {
                        label for="date_from" { "From" }
                        input type="date" name="date_from" id="date_from"
                            value=[non_empty(&query.date_from)];

                        label for="date_to" { "To" }
                        input type="date" name="date_to" id="date_to"
                            value=[non_empty(&query.date_to)];
                    }

                    div class="form-row"
                    {
                        label for="amount_min" { "Min amount" }
                        input type="number" name="amount_min" id="amount_min" step="0.01"
                            value=[non_empty(&query.amount_min)];

                        label for="amount_max" { "Max amount" }
                        input type="number" name="amount_max" id="amount_max" step="0.01"
                            value=[non_empty(&query.amount_max)];
                    }

                    button type="submit" class="button" { "Apply filters" }
                    " "
                    a href=(expenses_url) { "Clear" }
                }

                @if !saved_filters.is_empty() || !query.to_filter().is_empty()
                {
                    div class="saved-filters"
                    {
                        h3 { "Saved filters" }

                        @for saved in saved_filters
                        {
                            span class="filter-chip"
                            {
                                a href=(format!("{}?filter={}", expenses_url, saved.id))
                                {
                                    (saved.name)
                                }

                                form
                                    method="post"
                                    action=(endpoints::format_endpoint(endpoints::DELETE_FILTER, saved.id))
                                    class="inline-form"
                                {
                                    input type="hidden" name="group_id" value=(group.id);
                                    button type="submit" class="chip-delete" title="Delete saved filter"
                                    {
                                        "×"
                                    }
                                }
                            }
                        }

                        @if !query.to_filter().is_empty()
                        {
                            form method="post" action=(save_filter_url) class="inline-form"
                            {
                                input type="hidden" name="search" value=[non_empty(&query.search)];
                                @for category in &query.categories
                                {
                                    input type="hidden" name="categories" value=(category);
                                }
                                @for user in &query.users
                                {
                                    input type="hidden" name="users" value=(user);
                                }
                                input type="hidden" name="date_from" value=[non_empty(&query.date_from)];
                                input type="hidden" name="date_to" value=[non_empty(&query.date_to)];
                                input type="hidden" name="amount_min" value=[non_empty(&query.amount_min)];
                                input type="hidden" name="amount_max" value=[non_empty(&query.amount_max)];

                                input
                                    type="text"
                                    name="name"
                                    placeholder="Name this filter"
                                    maxlength="40"
                                    required;
                                button type="submit" class="button" { "Save filter" }
                            }
                        }
                    }
                }
            }

            section
            {
                p class="result-summary"
                {
                    "Showing " (filtered.len()) " of " (all_records.len()) " expenses"
                    " · Filtered total " (format_currency(total_of(filtered)))
                }

                table class="data-table"
                {
                    thead
                    {
                        tr
                        {
                            th { (sort_link("Date", "date")) }
                            th { "Member" }
                            th { "Category" }
                            th { "Description" }
                            th class="numeric" { (sort_link("Amount", "amount")) }
                            th { "" }
                        }
                    }
                    tbody
                    {
                        @for record in filtered
                        {
                            tr
                            {
                                td { (record.expense_date) }
                                td { (record.paid_by_name) }
                                td { (record.category) }
                                td
                                {
                                    (record.description)
                                    @if record.is_edited
                                    {
                                        " "
                                        span class="badge" { "edited" }
                                    }
                                }
                                td class="numeric" { (format_currency(record.amount)) }
                                td
                                {
                                    @if record.user_id == user_id || member_role == MemberRole::Admin
                                    {
                                        a href=(endpoints::format_endpoint(endpoints::EDIT_EXPENSE_VIEW, record.id))
                                        {
                                            "Edit"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base(&format!("{} Expenses", group.trip_name), &content)
}

#[cfg(test)]
mod expenses_query_tests {
    use time::macros::date;

    use crate::expense::filter::{SortKey, SortOrder};

    use super::ExpensesQuery;

    #[test]
    fn empty_query_builds_empty_filter() {
        let query = ExpensesQuery::default();

        assert!(query.to_filter().is_empty());
        assert_eq!(query.sort_key(), SortKey::ExpenseDate);
        assert_eq!(query.sort_order(), SortOrder::Descending);
    }

    #[test]
    fn blank_strings_count_as_unset() {
        let query = ExpensesQuery {
            search: Some("  ".to_string()),
            date_from: Some(String::new()),
            amount_min: Some(String::new()),
            ..Default::default()
        };

        assert!(query.to_filter().is_empty());
    }

    #[test]
    fn fields_parse_into_filter() {
        let query = ExpensesQuery {
            search: Some("ramen".to_string()),
            categories: vec!["Food".to_string()],
            users: vec![3],
            date_from: Some("2026-03-01".to_string()),
            date_to: Some("2026-03-05".to_string()),
            amount_min: Some("10".to_string()),
            amount_max: Some("99.5".to_string()),
            ..Default::default()
        };

        let filter = query.to_filter();

        assert_eq!(filter.search.as_deref(), Some("ramen"));
        assert_eq!(filter.date_from, Some(date!(2026 - 03 - 01)));
        assert_eq!(filter.date_to, Some(date!(2026 - 03 - 05)));
        assert_eq!(filter.amount_min, Some(10.0));
        assert_eq!(filter.amount_max, Some(99.5));
        assert!(filter.categories.unwrap().contains("Food"));
        assert!(filter.users.unwrap().contains(&3));
    }

    #[test]
    fn unparsable_dates_are_dropped() {
        let query = ExpensesQuery {
            date_from: Some("not a date".to_string()),
            ..Default::default()
        };

        assert_eq!(query.to_filter().date_from, None);
    }

    #[test]
    fn sort_fields_parse() {
        let query = ExpensesQuery {
            sort: Some("amount".to_string()),
            order: Some("asc".to_string()),
            ..Default::default()
        };

        assert_eq!(query.sort_key(), SortKey::Amount);
        assert_eq!(query.sort_order(), SortOrder::Ascending);
    }

    #[test]
    fn query_string_preserves_filters_when_sorting() {
        let query = ExpensesQuery {
            search: Some("ramen".to_string()),
            categories: vec!["Food".to_string(), "Transport".to_string()],
            ..Default::default()
        };

        let query_string = query.query_string_with_sort("amount", "asc");

        assert!(query_string.contains("search=ramen"));
        assert!(query_string.contains("categories=Food"));
        assert!(query_string.contains("categories=Transport"));
        assert!(query_string.contains("sort=amount"));
        assert!(query_string.contains("order=asc"));
    }
}
