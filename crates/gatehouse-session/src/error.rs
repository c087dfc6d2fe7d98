//! Error types for the session layer.

use gatehouse_identity::ProviderHandle;

/// Errors that can occur while tracking sessions.
///
/// None of these are raised while reconciling notifications; anomalies
/// there are absorbed and logged. They come from misuse of the tracking
/// API and from token refresh collaborators.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Fetching a fresh ID token failed. Carries the provider's
    /// description of the failure.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// A different provider is already tracked. Only one provider can be
    /// tracked at a time; untrack it first.
    #[error("provider {0} is already tracked")]
    AlreadyTracking(ProviderHandle),

    /// The provider is not the one being tracked.
    #[error("provider {0} is not tracked")]
    NotTracked(ProviderHandle),
}
