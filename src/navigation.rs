//! This file defines the templates and a convenience function for creating the navigation bar.

use maud::{Markup, html};

use crate::endpoints;

/// Template for a link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "nav-link nav-link-current"
        } else {
            "nav-link"
        };

        html!( a href=(self.url) class=(style) { (self.title) } )
    }
}

/// The navigation bar shown on every page behind the auth guard.
pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    pub fn new(active_endpoint: &str) -> NavBar<'_> {
        let links = vec![
            Link {
                url: endpoints::GROUPS_VIEW,
                title: "Trips",
                is_current: active_endpoint == endpoints::GROUPS_VIEW,
            },
            Link {
                url: endpoints::PERSONAL_BUDGET_VIEW,
                title: "My Budget",
                is_current: active_endpoint == endpoints::PERSONAL_BUDGET_VIEW,
            },
            Link {
                url: endpoints::LOG_OUT,
                title: "Log out",
                is_current: false,
            },
        ];

        NavBar { links }
    }

    /// Render the navigation bar.
    pub fn into_html(self) -> Markup {
        html! {
            nav class="nav-bar"
            {
                a href=(endpoints::GROUPS_VIEW) class="nav-brand" { "Tripledger" }

                div class="nav-links"
                {
                    @for nav_link in self.links
                    {
                        (nav_link.into_html())
                    }
                }
            }
        }
    }
}
