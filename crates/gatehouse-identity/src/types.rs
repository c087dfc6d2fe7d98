//! Core identity types.
//!
//! Everything in here is supplied by the identity provider. Gatehouse never
//! mints a user or a provider handle on its own; it only compares and
//! displays them.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Handles
// ---------------------------------------------------------------------------

/// Identifies one identity-provider client instance.
///
/// An application normally hosts exactly one provider client, but nothing
/// stops a second one from being created (a test harness, a secondary app
/// instance). Every notification carries the handle of the client that
/// sent it, so the session layer can tell its own provider apart from a
/// foreign one.
///
/// Same newtype pattern as [`UserId`]: cheap to copy, hashable, and
/// impossible to confuse with any other `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderHandle(pub u64);

impl fmt::Display for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auth-{}", self.0)
    }
}

/// The provider's stable identifier for a user account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Borrows the raw id string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// ---------------------------------------------------------------------------
// ProviderInfo
// ---------------------------------------------------------------------------

/// One linked sign-in method of a user (email/password, a federated
/// provider, a phone number, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// The sign-in method, e.g. `"password"` or `"google.com"`.
    pub provider_id: String,
    /// The user's id as known to that sign-in method.
    pub user_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
}

impl ProviderInfo {
    /// Human-readable lines describing this record, one property per line.
    ///
    /// Empty properties are skipped, so a bare email/password link prints
    /// only what it actually has.
    pub fn detail_lines(&self, indent_level: usize) -> Vec<String> {
        info_lines(
            indent_level,
            [
                ("Display Name", self.display_name.as_deref()),
                ("Email", self.email.as_deref()),
                ("Photo URL", self.photo_url.as_deref()),
                ("Provider ID", Some(self.provider_id.as_str())),
                ("User ID", Some(self.user_id.as_str())),
            ],
        )
    }
}

// ---------------------------------------------------------------------------
// UserIdentity
// ---------------------------------------------------------------------------

/// A signed-in user as reported by the identity provider.
///
/// The session layer treats this as opaque. The one question it asks is
/// "is this the same user as before?", answered by [`same_user`], which
/// compares the provider's `uid` and nothing else. A display-name edit on
/// the current account is not a session change; a different account is.
///
/// [`same_user`]: UserIdentity::same_user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: UserId,
    /// The identity service that issued this account, as opposed to the
    /// linked sign-in methods in `provider_data`.
    #[serde(default)]
    pub provider_id: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub photo_url: Option<String>,
    pub phone_number: Option<String>,
    pub is_anonymous: bool,
    pub email_verified: bool,
    /// Linked sign-in methods, in the order the provider reports them.
    #[serde(default)]
    pub provider_data: Vec<ProviderInfo>,
}

impl UserIdentity {
    /// Creates a bare identity with only a uid. Handy in tests and for
    /// providers that report nothing else.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: UserId(uid.into()),
            provider_id: String::new(),
            display_name: None,
            email: None,
            photo_url: None,
            phone_number: None,
            is_anonymous: false,
            email_verified: false,
            provider_data: Vec::new(),
        }
    }

    /// Sets the display name (builder style).
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Sets the email (builder style).
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// `true` if both values describe the same account.
    pub fn same_user(&self, other: &UserIdentity) -> bool {
        self.uid == other.uid
    }

    /// The name to greet the user with: display name if set, else email,
    /// else the raw uid.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
            .unwrap_or(self.uid.as_str())
    }

    /// Detailed, indented description of the user for diagnostic logs.
    ///
    /// Includes the top-level profile with the issuing provider id, the
    /// anonymous and email-verified flags, the phone number, and every
    /// linked provider record nested two levels deeper.
    pub fn detail_lines(&self, indent_level: usize) -> Vec<String> {
        let indent = indent_for(indent_level);
        let mut lines = info_lines(
            indent_level,
            [
                ("Display Name", self.display_name.as_deref()),
                ("Email", self.email.as_deref()),
                ("Photo URL", self.photo_url.as_deref()),
                ("Provider ID", Some(self.provider_id.as_str())),
                ("User ID", Some(self.uid.as_str())),
            ],
        );
        lines.push(format!("{indent}Anonymous: {}", self.is_anonymous));
        lines.push(format!("{indent}Email Verified: {}", self.email_verified));
        lines.push(format!(
            "{indent}Phone Number: {}",
            self.phone_number.as_deref().unwrap_or_default()
        ));
        for (i, info) in self.provider_data.iter().enumerate() {
            lines.push(format!("{indent}Provider Data: {i}"));
            lines.extend(info.detail_lines(indent_level + 2));
        }
        lines
    }
}

/// Two spaces per indent level.
pub(crate) fn indent_for(level: usize) -> String {
    " ".repeat(level * 2)
}

fn info_lines<'a>(
    indent_level: usize,
    properties: impl IntoIterator<Item = (&'a str, Option<&'a str>)>,
) -> Vec<String> {
    let indent = indent_for(indent_level);
    properties
        .into_iter()
        .filter_map(|(key, value)| match value {
            Some(v) if !v.is_empty() => Some(format!("{indent}{key}: {v}")),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_handle_display() {
        assert_eq!(ProviderHandle(3).to_string(), "auth-3");
    }

    #[test]
    fn test_same_user_ignores_profile_changes() {
        let before = UserIdentity::new("u1").with_display_name("Ada");
        let after = UserIdentity::new("u1").with_display_name("Ada L.");

        assert!(before.same_user(&after));
        assert_ne!(before, after, "value equality still sees the edit");
    }

    #[test]
    fn test_same_user_different_uid_is_false() {
        assert!(!UserIdentity::new("u1").same_user(&UserIdentity::new("u2")));
    }

    #[test]
    fn test_label_falls_back_to_email_then_uid() {
        let named = UserIdentity::new("u1").with_display_name("Ada");
        let emailed = UserIdentity::new("u2").with_email("b@example.com");
        let bare = UserIdentity::new("u3");

        assert_eq!(named.label(), "Ada");
        assert_eq!(emailed.label(), "b@example.com");
        assert_eq!(bare.label(), "u3");
    }

    #[test]
    fn test_detail_lines_skips_empty_fields_and_nests_providers() {
        let mut user = UserIdentity::new("u1").with_email("a@example.com");
        user.provider_id = "gatehouse".into();
        user.email_verified = true;
        user.provider_data.push(ProviderInfo {
            provider_id: "password".into(),
            user_id: "a@example.com".into(),
            ..ProviderInfo::default()
        });

        let lines = user.detail_lines(1);

        assert!(lines.contains(&"  Email: a@example.com".to_string()));
        assert!(lines.contains(&"  User ID: u1".to_string()));
        assert!(lines.contains(&"  Provider ID: gatehouse".to_string()));
        assert!(lines.contains(&"  Email Verified: true".to_string()));
        assert!(lines.contains(&"  Provider Data: 0".to_string()));
        assert!(lines.contains(&"      Provider ID: password".to_string()));
        assert!(
            !lines.iter().any(|l| l.contains("Display Name")),
            "unset display name should be skipped"
        );
    }

    #[test]
    fn test_user_identity_json_uses_bare_uid() {
        let json = serde_json::to_value(UserIdentity::new("u1")).unwrap();
        assert_eq!(json["uid"], "u1");
        assert_eq!(json["provider_data"], serde_json::json!([]));
    }
}
