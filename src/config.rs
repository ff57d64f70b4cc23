//! The role-assignment configuration.
//!
//! Earlier versions of this application kept the email-to-role table
//! inlined in the sign-in code. It now lives in a JSON file that the
//! server loads once at startup: load, validate, then freeze. The frozen
//! config is shared read-only through [crate::AppState] and never mutated
//! at runtime.

use std::{collections::HashMap, path::Path};

use crate::{Error, user::Role};

/// A frozen mapping from email address to account role.
///
/// Emails not present in the mapping get [Role::User].
#[derive(Debug, Clone, Default)]
pub struct RoleConfig {
    assignments: HashMap<String, Role>,
}

impl RoleConfig {
    /// A config with no assignments: every account registers as [Role::User].
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse and validate a role config from JSON text.
    ///
    /// The expected shape is a flat object mapping email addresses to role
    /// names, e.g. `{"ana@example.com": "Admin", "guest@example.com": "Viewer"}`.
    /// Emails are normalized to lowercase so lookups are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidRoleConfig] if the JSON cannot be parsed, an
    /// email is empty, or a role name is not one of Admin, User, Viewer.
    pub fn from_json(text: &str) -> Result<Self, Error> {
        let raw: HashMap<String, String> = serde_json::from_str(text)
            .map_err(|error| Error::InvalidRoleConfig(error.to_string()))?;

        let mut assignments = HashMap::with_capacity(raw.len());

        for (email, role_name) in raw {
            let email = email.trim().to_lowercase();

            if email.is_empty() {
                return Err(Error::InvalidRoleConfig(
                    "empty email address in role config".to_owned(),
                ));
            }

            let role = Role::parse(&role_name)?;
            assignments.insert(email, role);
        }

        Ok(Self { assignments })
    }

    /// Load and validate a role config from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidRoleConfig] if the file cannot be read or the
    /// contents fail validation.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|error| {
            Error::InvalidRoleConfig(format!("could not read {}: {error}", path.display()))
        })?;

        Self::from_json(&text)
    }

    /// The role assigned to `email`, or [Role::User] if unassigned.
    pub fn role_for(&self, email: &str) -> Role {
        self.assignments
            .get(&email.trim().to_lowercase())
            .copied()
            .unwrap_or(Role::User)
    }
}
