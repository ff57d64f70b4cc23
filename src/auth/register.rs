//! Route handlers for the registration page and creating user accounts.
//!
//! An account is created on first sign-in; its role comes from the frozen
//! role configuration loaded at server startup.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Duration;

use crate::{
    AppState, Error, PasswordHash, ValidatedPassword,
    config::RoleConfig,
    endpoints,
    html::{base, form_error, link},
    user::create_user,
};

use super::cookie::set_auth_cookie;

/// The minimum length the registration form will accept for passwords.
const MINIMUM_PASSWORD_LENGTH: u8 = 14;

fn register_form(email: &str, full_name: &str, error_message: Option<&str>) -> Markup {
    html! {
        section class="auth-card"
        {
            h1 { "Create your account" }

            form method="post" action=(endpoints::USERS)
            {
                @if let Some(error_message) = error_message
                {
                    (form_error(error_message))
                }

                label for="full_name" { "Name" }
                input type="text" name="full_name" id="full_name" value=(full_name) required autofocus;

                label for="email" { "Email" }
                input type="email" name="email" id="email" value=(email) required;

                label for="password" { "Password" }
                input
                    type="password"
                    name="password"
                    id="password"
                    placeholder="••••••••"
                    minlength=(MINIMUM_PASSWORD_LENGTH)
                    required;

                label for="confirm_password" { "Confirm password" }
                input
                    type="password"
                    name="confirm_password"
                    id="confirm_password"
                    placeholder="••••••••"
                    minlength=(MINIMUM_PASSWORD_LENGTH)
                    required;

                button type="submit" class="button" { "Register" }
            }

            p
            {
                "Already have an account? "
                (link(endpoints::LOG_IN_VIEW, "Log in here"))
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    base("Register", &register_form("", "", None)).into_response()
}

/// The state needed to register an account.
#[derive(Clone)]
pub struct RegisterState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    /// The frozen email-to-role assignments loaded at startup.
    pub role_config: Arc<RoleConfig>,
    /// The database connection for creating accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegisterState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            role_config: state.role_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegisterState> for Key {
    fn from_ref(state: &RegisterState) -> Self {
        state.cookie_key.clone()
    }
}

/// The data entered into the registration form.
#[derive(Deserialize)]
pub struct RegisterForm {
    /// The name shown to other group members.
    pub full_name: String,
    /// The email address to sign in with.
    pub email: String,
    /// The chosen password.
    pub password: String,
    /// The chosen password, again.
    pub confirm_password: String,
}

/// Handler for creating a new account.
///
/// On success the new user is logged in and redirected to the groups page.
/// Validation failures re-render the form with an inline message.
pub async fn register_user(
    State(state): State<RegisterState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let full_name = form.full_name.trim();
    let email = form.email.trim().to_lowercase();

    let render_error = |message: &str| {
        base("Register", &register_form(&email, full_name, Some(message))).into_response()
    };

    if full_name.is_empty() {
        return render_error("Please enter your name.");
    }

    // The email only needs to be plausible: it is an identifier here, not a
    // delivery address.
    if !email.contains('@') {
        return render_error("Please enter a valid email address.");
    }

    if form.password != form.confirm_password {
        return render_error("The passwords do not match.");
    }

    let validated_password = match ValidatedPassword::new(&form.password) {
        Ok(password) => password,
        Err(Error::TooWeak(feedback)) => {
            return render_error(&format!("Password is too weak: {feedback}"));
        }
        Err(error) => {
            tracing::error!("Unexpected error validating password: {error}");
            return render_error("An internal error occurred. Please try again later.");
        }
    };

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("Could not hash password: {error}");
            return render_error("An internal error occurred. Please try again later.");
        }
    };

    let role = state.role_config.role_for(&email);

    let user = {
        let connection = match state.db_connection.lock() {
            Ok(connection) => connection,
            Err(error) => {
                tracing::error!("could not acquire database lock: {error}");
                return Error::DatabaseLockError.into_response();
            }
        };

        match create_user(&email, full_name, role, password_hash, &connection) {
            Ok(user) => user,
            Err(Error::DuplicateEmail) => {
                return render_error("That email is already registered. Try logging in instead.");
            }
            Err(error) => {
                tracing::error!("Could not create user: {error}");
                return render_error("An internal error occurred. Please try again later.");
            }
        }
    };

    match set_auth_cookie(jar, user.id, state.cookie_duration) {
        Ok(updated_jar) => (updated_jar, Redirect::to(endpoints::GROUPS_VIEW)).into_response(),
        Err(error) => {
            tracing::error!("Error setting auth cookie: {error}");
            Redirect::to(endpoints::LOG_IN_VIEW).into_response()
        }
    }
}
