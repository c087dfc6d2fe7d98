//! Token refresh hook and the tickets that gate it.
//!
//! The reconciler never fetches a token itself. When an ID-token
//! notification warrants a refresh it hands out a [`RefreshTicket`]; the
//! caller runs the refresh however it likes (usually through a
//! [`TokenRefresher`] on a spawned task) and gives the ticket back with the
//! result. While a ticket is outstanding, further notifications for the
//! same provider are coalesced into it.

use std::future::Future;

use gatehouse_identity::{ProviderHandle, UserId};

use crate::SessionError;

/// Fetches a fresh ID token for a provider's current user.
///
/// # Trait bounds
///
/// - `Send + Sync` → shared with the task that runs the refresh.
/// - `'static` → lives as long as the driver that owns it.
///
/// # Example
///
/// ```rust
/// use gatehouse_identity::ProviderHandle;
/// use gatehouse_session::{SessionError, TokenRefresher};
///
/// /// Always hands back the same token. Only useful in tests.
/// struct FixedToken(&'static str);
///
/// impl TokenRefresher for FixedToken {
///     async fn refresh_token(
///         &self,
///         _provider: ProviderHandle,
///         _force_refresh: bool,
///     ) -> Result<String, SessionError> {
///         Ok(self.0.to_string())
///     }
/// }
/// ```
pub trait TokenRefresher: Send + Sync + 'static {
    /// Returns an ID token for the current user of `provider`.
    ///
    /// # Returns
    /// - `Ok(token)` — the (possibly cached) token
    /// - `Err(SessionError::RefreshFailed)` — the provider or network
    ///   failed; the caller logs it and carries on
    fn refresh_token(
        &self,
        provider: ProviderHandle,
        force_refresh: bool,
    ) -> impl Future<Output = Result<String, SessionError>> + Send;
}

/// Permission to run exactly one token refresh.
///
/// Issued by
/// [`SessionReconciler::on_id_token_notification`](crate::SessionReconciler::on_id_token_notification)
/// and consumed by
/// [`SessionReconciler::complete_refresh`](crate::SessionReconciler::complete_refresh).
/// Not `Clone`: one ticket, one completion.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a ticket holds the refresh guard until it is completed"]
pub struct RefreshTicket {
    pub(crate) id: u64,
    pub(crate) provider: ProviderHandle,
    pub(crate) user: UserId,
    pub(crate) force_refresh: bool,
}

impl RefreshTicket {
    /// The provider whose token should be refreshed.
    pub fn provider(&self) -> ProviderHandle {
        self.provider
    }

    /// The user that was current when the ticket was issued.
    pub fn user(&self) -> &UserId {
        &self.user
    }

    /// The `force_refresh` flag to pass to the refresher.
    pub fn force_refresh(&self) -> bool {
        self.force_refresh
    }
}
