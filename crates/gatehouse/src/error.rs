//! Unified error type for Gatehouse.

use gatehouse_provider::ProviderError;
use gatehouse_session::SessionError;

use crate::FormError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `gatehouse` facade you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]` attribute
/// on each variant generates `From` impls, so `?` converts sub-crate errors
/// automatically.
#[derive(Debug, thiserror::Error)]
pub enum GatehouseError {
    /// The identity provider failed or is unavailable.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Session tracking was misused (e.g. a second provider attached).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A sign-in or sign-up form rejected the submission.
    #[error(transparent)]
    Form(#[from] FormError),

    /// The session driver is no longer running.
    #[error("session driver has been detached")]
    Detached,
}
