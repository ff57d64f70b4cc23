//! The core group types: trip names, invite codes, groups and memberships.

use std::fmt::Display;

use rand::{Rng, rngs::OsRng};
use unicode_segmentation::UnicodeSegmentation;

use crate::{Error, user::UserId};

/// Alias for the integer type used for group IDs in the database.
pub type GroupId = i64;

/// The categories every group starts with. Logging an expense with a new
/// category adds it to the group's custom category list.
pub const DEFAULT_CATEGORIES: [&str; 8] = [
    "Food",
    "Transport",
    "Accommodation",
    "Activities",
    "Shopping",
    "Utilities",
    "Entertainment",
    "Other",
];

/// The maximum trip name length in grapheme clusters.
const MAX_TRIP_NAME_LENGTH: usize = 60;

/// A validated trip name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TripName(String);

impl TripName {
    /// Create a trip name, trimming surrounding whitespace.
    ///
    /// # Errors
    ///
    /// Returns [Error::EmptyTripName] if `name` is empty or whitespace, or
    /// [Error::TripNameTooLong] if it is longer than 60 characters.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            return Err(Error::EmptyTripName);
        }

        if name.graphemes(true).count() > MAX_TRIP_NAME_LENGTH {
            return Err(Error::TripNameTooLong(MAX_TRIP_NAME_LENGTH));
        }

        Ok(Self(name.to_string()))
    }

    /// Create a trip name without validation.
    ///
    /// The caller should ensure that the string is not empty.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for TripName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for TripName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The number of characters in an invite code.
pub const INVITE_CODE_LENGTH: usize = 8;

const INVITE_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// A group's join token: 8 uppercase letters and digits.
///
/// Codes are shown to the group admin and typed in by joiners, so input is
/// normalized to uppercase before any lookup.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InviteCode(String);

impl InviteCode {
    /// Generate a fresh invite code from the operating system's RNG.
    ///
    /// Codes are not checked against existing groups here. The invite code
    /// column is UNIQUE, so the unlikely collision surfaces as
    /// [Error::DuplicateInviteCode] at insert time rather than producing two
    /// groups that share a code.
    pub fn generate() -> Self {
        let mut rng = OsRng;
        let code: String = (0..INVITE_CODE_LENGTH)
            .map(|_| {
                let index = rng.gen_range(0..INVITE_CODE_ALPHABET.len());
                INVITE_CODE_ALPHABET[index] as char
            })
            .collect();

        Self(code)
    }

    /// Normalize and validate a code typed in by a user.
    ///
    /// Input is trimmed and uppercased, so codes are case-insensitive.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidInviteCode] if the normalized code is not
    /// exactly 8 ASCII letters and digits.
    pub fn parse(input: &str) -> Result<Self, Error> {
        let code = input.trim().to_uppercase();

        if code.len() != INVITE_CODE_LENGTH
            || !code.bytes().all(|byte| INVITE_CODE_ALPHABET.contains(&byte))
        {
            return Err(Error::InvalidInviteCode);
        }

        Ok(Self(code))
    }

    /// Wrap a code that is already known to be valid, e.g. from the database.
    pub fn new_unchecked(code: &str) -> Self {
        Self(code.to_string())
    }
}

impl AsRef<str> for InviteCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for InviteCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Check that a budget amount is a positive, finite number.
///
/// # Errors
///
/// Returns [Error::InvalidBudget] otherwise.
pub fn validate_budget(amount: f64) -> Result<f64, Error> {
    if amount.is_finite() && amount > 0.0 {
        Ok(amount)
    } else {
        Err(Error::InvalidBudget)
    }
}

/// A trip group: the container that a budget, members and expenses hang off.
#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    /// The group's ID in the application database.
    pub id: GroupId,
    /// The name of the trip, e.g. "Japan 2026".
    pub trip_name: TripName,
    /// The shared budget ceiling for the whole trip.
    pub total_budget: f64,
    /// The code members use to join this group.
    pub invite_code: InviteCode,
    /// The user that created the group. Always the group admin.
    pub created_by: UserId,
    /// Inactive groups cannot be joined.
    pub is_active: bool,
    /// Categories added by members on top of [DEFAULT_CATEGORIES].
    pub custom_categories: Vec<String>,
}

impl Group {
    /// The categories available for this group's expenses: the default set
    /// followed by the group's custom additions.
    pub fn categories(&self) -> Vec<String> {
        DEFAULT_CATEGORIES
            .iter()
            .map(|category| category.to_string())
            .chain(self.custom_categories.iter().cloned())
            .collect()
    }
}

/// A user's role within a single group.
///
/// This is independent of the account-level [crate::Role]: the group
/// creator is the group admin no matter their account role.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberRole {
    /// The group's creator. Exactly one per group, never removable.
    Admin,
    /// Everyone who joined with the invite code.
    Member,
}

impl MemberRole {
    /// The role name as stored in the membership table.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberRole::Admin => "admin",
            MemberRole::Member => "member",
        }
    }

    /// Parse a role name from the membership table.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "admin" => Some(MemberRole::Admin),
            "member" => Some(MemberRole::Member),
            _ => None,
        }
    }
}

/// A group member with their profile fields, for member lists and reports.
#[derive(Clone, Debug, PartialEq)]
pub struct Member {
    /// The member's user ID.
    pub user_id: UserId,
    /// The member's display name.
    pub full_name: String,
    /// The member's email address.
    pub email: String,
    /// Whether the member is the group admin.
    pub role: MemberRole,
}


#[cfg(test)]
mod invite_code_tests {
    use crate::Error;

    use super::{INVITE_CODE_LENGTH, InviteCode};

    #[test]
    fn generated_codes_are_uppercase_alphanumeric() {
        for _ in 0..100 {
            let code = InviteCode::generate();

            assert_eq!(code.as_ref().len(), INVITE_CODE_LENGTH);
            assert!(
                code.as_ref()
                    .chars()
                    .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()),
                "unexpected character in invite code {code}"
            );
        }
    }

    #[test]
    fn parse_normalizes_to_uppercase() {
        let code = InviteCode::parse("abcd1234").unwrap();

        assert_eq!(code.as_ref(), "ABCD1234");
    }

    #[test]
    fn parse_trims_whitespace() {
        let code = InviteCode::parse(" ABCD1234 ").unwrap();

        assert_eq!(code.as_ref(), "ABCD1234");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(InviteCode::parse("ABC"), Err(Error::InvalidInviteCode));
        assert_eq!(
            InviteCode::parse("ABCD12345"),
            Err(Error::InvalidInviteCode)
        );
    }

    #[test]
    fn parse_rejects_non_alphanumeric_characters() {
        assert_eq!(
            InviteCode::parse("ABCD-123"),
            Err(Error::InvalidInviteCode)
        );
    }
}
