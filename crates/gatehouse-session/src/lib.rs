//! Session reconciliation for Gatehouse.
//!
//! An identity provider tells the application about the signed-in user
//! through two overlapping notification streams: "auth state changed" and
//! "ID token changed". Either can fire spuriously, twice in a row, or from
//! a provider instance the application doesn't care about. This crate turns
//! that noise into a clean sequence of session transitions:
//!
//! 1. **Reconciliation** — [`SessionReconciler`] tracks the last known user
//!    per provider and emits [`SessionTransition::SignedOut`] /
//!    [`SessionTransition::SignedIn`] exactly once per real change
//! 2. **Token refresh** — the same reconciler gates refresh requests so at
//!    most one is in flight per provider ([`RefreshTicket`])
//! 3. **Refresh hook** — the [`TokenRefresher`] trait, implemented by
//!    whatever can actually fetch a token
//!
//! # How it fits in the stack
//!
//! ```text
//! Facade (above)  ← marshals provider events onto one task, navigates
//!     ↕
//! Session Layer (this crate)  ← pure, synchronous state tracking
//!     ↕
//! Identity Layer (below)  ← provides ProviderHandle, UserIdentity
//! ```
//!
//! Nothing in here spawns tasks, takes locks, or awaits. The caller owns the
//! reconciler and feeds it events one at a time.

mod error;
mod reconciler;
mod refresh;
mod session;

pub use error::SessionError;
pub use reconciler::SessionReconciler;
pub use refresh::{RefreshTicket, TokenRefresher};
pub use session::{ReconcilerConfig, SessionRecord, SessionState, SessionTransition};
