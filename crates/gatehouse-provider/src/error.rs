use gatehouse_identity::AuthErrorCode;

use crate::DependencyStatus;

/// Errors reported by an identity provider.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ProviderError {
    /// The provider rejected the request with one of its error codes.
    #[error("AuthError.{code}: {message}")]
    Auth {
        code: AuthErrorCode,
        message: String,
    },

    /// The request was cancelled before it completed.
    #[error("request cancelled")]
    Cancelled,

    /// The operation needs a signed-in user and there is none.
    #[error("no user is signed in")]
    NotSignedIn,

    /// The provider's dependencies could not be resolved.
    #[error("provider unavailable: {0}")]
    Unavailable(DependencyStatus),
}

impl ProviderError {
    /// Shorthand for an [`Auth`](Self::Auth) error.
    pub fn auth(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self::Auth {
            code,
            message: message.into(),
        }
    }

    /// The provider error code, if this is an [`Auth`](Self::Auth) error.
    pub fn code(&self) -> Option<AuthErrorCode> {
        match self {
            Self::Auth { code, .. } => Some(*code),
            _ => None,
        }
    }
}
