//! Session types: what the reconciler remembers about each provider.
//!
//! A "session" here is the application's view of who is signed in with a
//! given identity-provider instance. It tracks:
//! - WHICH provider it belongs to (`ProviderHandle`)
//! - WHO is signed in, if anyone (`SessionState`)
//! - HOW MANY real transitions it has gone through

use gatehouse_identity::{ProviderHandle, UserIdentity};

// ---------------------------------------------------------------------------
// ReconcilerConfig
// ---------------------------------------------------------------------------

/// Configuration for reconciler behavior.
///
/// Sensible defaults are provided; override only the fields you care about:
///
/// ```rust
/// use gatehouse_session::ReconcilerConfig;
///
/// let config = ReconcilerConfig {
///     log_user_details: false,
///     ..ReconcilerConfig::default()
/// };
/// assert_eq!(config.token_preview_len, 8);
/// ```
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// How many leading characters of a refreshed token are surfaced for
    /// diagnostic logging.
    ///
    /// Default: 8. The preview is for humans reading logs; it is never
    /// used to make an authorization decision.
    pub token_preview_len: usize,

    /// Passed through to the token refresher. `false` lets the provider
    /// return a cached token that hasn't expired yet.
    ///
    /// Default: `false`.
    pub force_refresh: bool,

    /// Log a detailed, multi-line description of the user (at `debug`)
    /// on every sign-in.
    ///
    /// Default: `true`.
    pub log_user_details: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            token_preview_len: 8,
            force_refresh: false,
            log_user_details: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// Who, if anyone, is signed in with a provider.
///
/// A two-state machine with no terminal state:
///
/// ```text
///   Anonymous ──(user appears)──→ Authenticated(user)
///       ↑                              │
///       └──────(user disappears)───────┘
///
///   Authenticated(a) ──(different user b)──→ Authenticated(b)
///                      (emits SignedOut(a) then SignedIn(b))
/// ```
///
/// Every provider starts out `Anonymous`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    /// Nobody is signed in.
    #[default]
    Anonymous,

    /// The given user is signed in.
    Authenticated(UserIdentity),
}

impl SessionState {
    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(user) => Some(user),
        }
    }

    /// Returns `true` if someone is signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// `true` if `user` describes the same session as this state:
    /// both absent, or both the same account.
    pub(crate) fn matches(&self, user: Option<&UserIdentity>) -> bool {
        match (self.user(), user) {
            (None, None) => true,
            (Some(known), Some(current)) => known.same_user(current),
            _ => false,
        }
    }
}

impl From<Option<UserIdentity>> for SessionState {
    fn from(user: Option<UserIdentity>) -> Self {
        user.map_or(Self::Anonymous, Self::Authenticated)
    }
}

// ---------------------------------------------------------------------------
// SessionRecord
// ---------------------------------------------------------------------------

/// The reconciler's record for one provider.
///
/// Created the first time the tracked provider reports its state. Lives for
/// the rest of the process; signing out clears it back to `Anonymous` rather
/// than removing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    /// Which provider this record belongs to.
    pub provider: ProviderHandle,

    /// Current session state.
    pub state: SessionState,

    /// Number of transitions emitted for this provider so far.
    pub transitions: u64,
}

impl SessionRecord {
    pub(crate) fn new(provider: ProviderHandle) -> Self {
        Self {
            provider,
            state: SessionState::Anonymous,
            transitions: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionTransition
// ---------------------------------------------------------------------------

/// A meaningful change in who is signed in.
///
/// Reconciling a notification produces zero, one, or two of these. Zero
/// means the notification was a no-op (duplicate, foreign, or same user).
/// Two only ever happens on a user switch, and then always in the order
/// `SignedOut(previous)`, `SignedIn(new)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionTransition {
    /// The given user is now signed in.
    SignedIn(UserIdentity),

    /// The given user, previously signed in, no longer is.
    SignedOut(UserIdentity),
}

impl SessionTransition {
    /// The user this transition is about.
    pub fn user(&self) -> &UserIdentity {
        match self {
            Self::SignedIn(user) | Self::SignedOut(user) => user,
        }
    }

    pub fn is_sign_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_default_is_anonymous() {
        assert_eq!(SessionState::default(), SessionState::Anonymous);
        assert!(!SessionState::default().is_authenticated());
    }

    #[test]
    fn test_session_state_from_option() {
        let user = UserIdentity::new("u1");
        assert_eq!(SessionState::from(None), SessionState::Anonymous);
        assert_eq!(
            SessionState::from(Some(user.clone())),
            SessionState::Authenticated(user)
        );
    }

    #[test]
    fn test_matches_compares_by_uid() {
        let state = SessionState::Authenticated(UserIdentity::new("u1"));
        let renamed = UserIdentity::new("u1").with_display_name("New Name");

        assert!(state.matches(Some(&renamed)));
        assert!(!state.matches(Some(&UserIdentity::new("u2"))));
        assert!(!state.matches(None));
        assert!(SessionState::Anonymous.matches(None));
    }

    #[test]
    fn test_reconciler_config_defaults() {
        let config = ReconcilerConfig::default();
        assert_eq!(config.token_preview_len, 8);
        assert!(!config.force_refresh);
        assert!(config.log_user_details);
    }
}
