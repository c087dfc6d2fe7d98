//! Identity provider abstraction for Gatehouse.
//!
//! Provides the [`IdentityProvider`] trait that abstracts over the external
//! identity service (a hosted auth SDK, a test double), and the
//! [`AuthEvent`] notifications it broadcasts.
//!
//! # Feature Flags
//!
//! - `memory` (default) — [`MemoryProvider`], an in-process provider for
//!   demos and tests

mod error;
#[cfg(feature = "memory")]
mod memory;

pub use error::ProviderError;
#[cfg(feature = "memory")]
pub use memory::MemoryProvider;

use std::fmt;
use std::future::Future;

use gatehouse_identity::{ProviderHandle, SignInResult, UserIdentity};
use tokio::sync::broadcast;

/// A notification from an identity provider.
///
/// Both variants carry the handle of the provider that sent them and the
/// provider's current user at the time of sending. Providers may send
/// either kind spuriously or twice in a row; consumers must cope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// The signed-in user may have changed.
    StateChanged {
        sender: ProviderHandle,
        user: Option<UserIdentity>,
    },
    /// The current user's ID token may have changed.
    IdTokenChanged {
        sender: ProviderHandle,
        user: Option<UserIdentity>,
    },
}

impl AuthEvent {
    /// The provider that sent this event.
    pub fn sender(&self) -> ProviderHandle {
        match self {
            Self::StateChanged { sender, .. } | Self::IdTokenChanged { sender, .. } => *sender,
        }
    }

    /// The user carried by this event, if any.
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            Self::StateChanged { user, .. } | Self::IdTokenChanged { user, .. } => user.as_ref(),
        }
    }
}

/// A live subscription to a provider's events.
///
/// Dropping the receiver unsubscribes.
pub type AuthEvents = broadcast::Receiver<AuthEvent>;

/// Whether the provider's runtime dependencies are usable.
///
/// Checked once at startup, before anything subscribes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyStatus {
    Available,
    UnavailableDisabled,
    UnavailableInvalid,
    UnavailableMissing,
    UnavailablePermission,
    UnavailableUpdating,
    UnavailableUpdaterequired,
    UnavailableOther,
}

impl DependencyStatus {
    pub fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }
}

impl fmt::Display for DependencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Profile fields to change on the current user. `None` leaves a field
/// as it is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// The external identity service.
///
/// Gatehouse never stores credentials or mints tokens; everything that
/// touches accounts goes through this trait.
///
/// Async methods return `impl Future + Send` so callers can move the work
/// onto a spawned Tokio task.
pub trait IdentityProvider: Send + Sync + 'static {
    /// The handle this provider stamps on every event it sends.
    fn handle(&self) -> ProviderHandle;

    /// The currently signed-in user, if any.
    fn current_user(&self) -> Option<UserIdentity>;

    /// Subscribes to state-changed and id-token-changed events.
    fn subscribe(&self) -> AuthEvents;

    /// Checks that the provider can be used at all.
    fn check_dependencies(&self) -> impl Future<Output = DependencyStatus> + Send;

    /// Returns an ID token for the current user.
    ///
    /// With `force_refresh = false` a cached, unexpired token may be
    /// returned.
    fn fetch_token(
        &self,
        force_refresh: bool,
    ) -> impl Future<Output = Result<String, ProviderError>> + Send;

    /// Signs in with email and password.
    fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<SignInResult, ProviderError>> + Send;

    /// Creates an account and signs it in.
    fn create_user_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<UserIdentity, ProviderError>> + Send;

    /// Updates the current user's profile.
    fn update_profile(
        &self,
        update: ProfileUpdate,
    ) -> impl Future<Output = Result<(), ProviderError>> + Send;

    /// Signs the current user out. Never fails.
    fn sign_out(&self);
}
