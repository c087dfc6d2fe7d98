//! Provider error codes and the form messages they turn into.
//!
//! The identity provider reports failures as numeric-ish codes. The sign-in
//! and sign-up screens show a short message under one input field. The
//! mapping differs slightly between the two forms: "weak password" only
//! means something when creating an account, "email already in use" only
//! when signing up, and so on.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Failure codes reported by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthErrorCode {
    MissingPassword,
    WrongPassword,
    WeakPassword,
    InvalidEmail,
    MissingEmail,
    UserNotFound,
    EmailAlreadyInUse,
    NetworkRequestFailed,
    /// A code this crate has no dedicated handling for.
    Other(i32),
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "Other({code})"),
            known => write!(f, "{known:?}"),
        }
    }
}

/// Which screen an error is being shown on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    SignIn,
    SignUp,
}

/// The input field a message is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormField {
    Email,
    Password,
}

/// A user-visible message shown under one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub field: FormField,
    pub text: String,
}

impl FieldMessage {
    pub fn email(text: impl Into<String>) -> Self {
        Self {
            field: FormField::Email,
            text: text.into(),
        }
    }

    pub fn password(text: impl Into<String>) -> Self {
        Self {
            field: FormField::Password,
            text: text.into(),
        }
    }
}

impl fmt::Display for FieldMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

const UNKNOWN_ERROR: &str = "Unknown error occurred.";

impl AuthErrorCode {
    /// The message to show on `form` for this code.
    ///
    /// Codes without a dedicated message fall back to
    /// "Unknown error occurred." under the email field.
    pub fn field_message(self, form: FormKind) -> FieldMessage {
        match (self, form) {
            (Self::MissingPassword, _) => FieldMessage::password("Missing password."),
            (Self::WrongPassword, FormKind::SignIn) => {
                FieldMessage::password("Incorrect password.")
            }
            (Self::WeakPassword, FormKind::SignUp) => {
                FieldMessage::password("Too weak of a password.")
            }
            (Self::InvalidEmail, _) => FieldMessage::email("Invalid email."),
            (Self::MissingEmail, _) => FieldMessage::email("Missing email."),
            (Self::UserNotFound, _) => FieldMessage::email("Account not found."),
            (Self::EmailAlreadyInUse, FormKind::SignUp) => {
                FieldMessage::email("Email already in use.")
            }
            _ => FieldMessage::email(UNKNOWN_ERROR),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_message_shared_codes_match_on_both_forms() {
        for form in [FormKind::SignIn, FormKind::SignUp] {
            assert_eq!(
                AuthErrorCode::MissingPassword.field_message(form),
                FieldMessage::password("Missing password.")
            );
            assert_eq!(
                AuthErrorCode::InvalidEmail.field_message(form),
                FieldMessage::email("Invalid email.")
            );
            assert_eq!(
                AuthErrorCode::MissingEmail.field_message(form),
                FieldMessage::email("Missing email.")
            );
            assert_eq!(
                AuthErrorCode::UserNotFound.field_message(form),
                FieldMessage::email("Account not found.")
            );
        }
    }

    #[test]
    fn test_field_message_wrong_password_only_on_sign_in() {
        assert_eq!(
            AuthErrorCode::WrongPassword.field_message(FormKind::SignIn),
            FieldMessage::password("Incorrect password.")
        );
        assert_eq!(
            AuthErrorCode::WrongPassword.field_message(FormKind::SignUp),
            FieldMessage::email(UNKNOWN_ERROR)
        );
    }

    #[test]
    fn test_field_message_sign_up_only_codes() {
        assert_eq!(
            AuthErrorCode::WeakPassword.field_message(FormKind::SignUp),
            FieldMessage::password("Too weak of a password.")
        );
        assert_eq!(
            AuthErrorCode::EmailAlreadyInUse.field_message(FormKind::SignUp),
            FieldMessage::email("Email already in use.")
        );
        assert_eq!(
            AuthErrorCode::WeakPassword.field_message(FormKind::SignIn),
            FieldMessage::email(UNKNOWN_ERROR)
        );
        assert_eq!(
            AuthErrorCode::EmailAlreadyInUse.field_message(FormKind::SignIn),
            FieldMessage::email(UNKNOWN_ERROR)
        );
    }

    #[test]
    fn test_field_message_unknown_codes_fall_back() {
        assert_eq!(
            AuthErrorCode::Other(17).field_message(FormKind::SignIn),
            FieldMessage::email(UNKNOWN_ERROR)
        );
        assert_eq!(
            AuthErrorCode::NetworkRequestFailed.field_message(FormKind::SignUp),
            FieldMessage::email(UNKNOWN_ERROR)
        );
    }

    #[test]
    fn test_display_matches_variant_name() {
        assert_eq!(AuthErrorCode::WrongPassword.to_string(), "WrongPassword");
        assert_eq!(AuthErrorCode::Other(9).to_string(), "Other(9)");
    }
}
