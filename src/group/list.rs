//! The groups overview page: every trip the user belongs to, plus the
//! create and join forms.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    Error, endpoints,
    expense::group_total_spent,
    group::{GroupState, db::get_user_groups, domain::Group},
    html::{base, form_error, format_currency},
    navigation::NavBar,
    user::{User, UserId, get_user_by_id},
};

/// A group together with the figures shown on its card.
struct GroupSummary {
    group: Group,
    spent: f64,
    remaining: f64,
    progress: f64,
}

/// Display the groups overview page.
pub async fn get_groups_page(
    State(state): State<GroupState>,
    Extension(user_id): Extension<UserId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let page = render_groups_page(user_id, None, None, &connection)?;

    Ok(page.into_response())
}

/// Build the groups overview page, optionally with an inline error above
/// the create or join form.
///
/// Shared with the create and join endpoints so validation failures can
/// re-render the page with a message.
pub(super) fn render_groups_page(
    user_id: UserId,
    create_error: Option<&str>,
    join_error: Option<&str>,
    connection: &Connection,
) -> Result<Markup, Error> {
    let user = get_user_by_id(user_id, connection)?;
    let groups = get_user_groups(user_id, connection)?;

    let summaries = groups
        .into_iter()
        .map(|group| {
            let spent = group_total_spent(group.id, connection)?;
            let progress = if group.total_budget > 0.0 {
                (spent / group.total_budget * 100.0).min(100.0)
            } else {
                0.0
            };

            Ok(GroupSummary {
                spent,
                remaining: group.total_budget - spent,
                progress,
                group,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(groups_view(&user, &summaries, create_error, join_error))
}

fn groups_view(
    user: &User,
    summaries: &[GroupSummary],
    create_error: Option<&str>,
    join_error: Option<&str>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::GROUPS_VIEW);
    let capabilities = user.role.capabilities();

    let content = html! {
        (nav_bar.into_html())

        main class="page"
        {
            header class="page-header"
            {
                h1 { "Your Trips" }
                p class="subtitle" { "Signed in as " (user.full_name) " (" (user.role) ")" }
            }

            @if summaries.is_empty()
            {
                p class="empty-state"
                {
                    "No trips yet. Create one below or join with an invite code."
                }
            }
            @else
            {
                section class="card-grid"
                {
                    @for summary in summaries
                    {
                        (group_card(summary))
                    }
                }
            }

            div class="form-columns"
            {
                @if capabilities.can_edit
                {
                    section class="form-card"
                    {
                        h2 { "Create a trip" }

                        form method="post" action=(endpoints::CREATE_GROUP)
                        {
                            @if let Some(message) = create_error
                            {
                                (form_error(message))
                            }

                            label for="trip_name" { "Trip name" }
                            input type="text" name="trip_name" id="trip_name" maxlength="60" required;

                            label for="total_budget" { "Total budget" }
                            input
                                type="number"
                                name="total_budget"
                                id="total_budget"
                                min="0.01"
                                step="0.01"
                                required;

                            button type="submit" class="button" { "Create trip" }
                        }
                    }
                }

                section class="form-card"
                {
                    h2 { "Join a trip" }

                    form method="post" action=(endpoints::JOIN_GROUP)
                    {
                        @if let Some(message) = join_error
                        {
                            (form_error(message))
                        }

                        label for="invite_code" { "Invite code" }
                        input
                            type="text"
                            name="invite_code"
                            id="invite_code"
                            maxlength="8"
                            placeholder="ABCD1234"
                            style="text-transform: uppercase"
                            required;

                        button type="submit" class="button" { "Join trip" }
                    }
                }
            }
        }
    };

    base("Your Trips", &content)
}

fn group_card(summary: &GroupSummary) -> Markup {
    let dashboard_url = endpoints::format_endpoint(endpoints::GROUP_DASHBOARD_VIEW, summary.group.id);
    let over_budget = summary.remaining < 0.0;

    html! {
        a class="trip-card" href=(dashboard_url)
        {
            h3 { (summary.group.trip_name) }

            p class="trip-card-budget"
            {
                (format_currency(summary.spent))
                " of "
                (format_currency(summary.group.total_budget))
                " spent"
            }

            div class="progress-track"
            {
                div
                    class=(if over_budget { "progress-fill progress-fill-over" } else { "progress-fill" })
                    style=(format!("width: {:.0}%", summary.progress)) {}
            }

            p class=(if over_budget { "trip-card-remaining over-budget" } else { "trip-card-remaining" })
            {
                @if over_budget
                {
                    (format_currency(-summary.remaining)) " over budget"
                }
                @else
                {
                    (format_currency(summary.remaining)) " remaining"
                }
            }
        }
    }
}
