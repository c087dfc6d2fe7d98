//! # Gatehouse
//!
//! Session-aware authentication glue for game clients.
//!
//! An identity provider (a hosted auth service, or the in-process
//! [`MemoryProvider`](gatehouse_provider::MemoryProvider)) tells the client
//! when the signed-in user or their ID token changes. Those notifications
//! arrive duplicated, reordered, and sometimes from the wrong provider
//! instance. Gatehouse turns them into a clean sequence of signed-in and
//! signed-out transitions, switches the visible view accordingly, and keeps
//! at most one token refresh in flight.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use gatehouse::prelude::*;
//!
//! # async fn run() -> Result<(), GatehouseError> {
//! gatehouse::init_tracing();
//!
//! let provider = Arc::new(MemoryProvider::new());
//! let (navigator, mut views) = ChannelNavigator::new();
//! let attachment = SessionDriverBuilder::new()
//!     .attach(Arc::clone(&provider), navigator)
//!     .await?;
//!
//! let sign_up = SignUpForm::new(Arc::clone(&provider)).with_display_name("Ada");
//! sign_up.submit("ada@example.com", "secret1", "secret1").await?;
//!
//! while let Some(view) = views.recv().await {
//!     if view == View::Main {
//!         break;
//!     }
//! }
//! attachment.detach().await
//! # }
//! ```
//!
//! ## Crates
//!
//! - `gatehouse-identity`: users, sign-in results, error-code messages
//! - `gatehouse-provider`: the [`IdentityProvider`](gatehouse_provider::IdentityProvider) trait
//! - `gatehouse-session`: the [`SessionReconciler`](gatehouse_session::SessionReconciler)
//! - `gatehouse` (this crate): driver, navigation, forms

mod driver;
mod error;
mod forms;
mod navigation;
mod telemetry;
mod tokens;

pub use driver::{Attachment, SessionDriverBuilder};
pub use error::GatehouseError;
pub use forms::{sign_out, FormError, FormStatus, SignInForm, SignUpForm};
pub use navigation::{ChannelNavigator, Navigator, View};
pub use telemetry::init_tracing;
pub use tokens::ProviderTokens;

/// Everything needed to wire up an authentication flow.
pub mod prelude {
    pub use crate::{
        init_tracing, sign_out, Attachment, ChannelNavigator, FormError, FormStatus,
        GatehouseError, Navigator, SessionDriverBuilder, SignInForm, SignUpForm, View,
    };

    pub use gatehouse_identity::{
        AuthErrorCode, FieldMessage, FormField, FormKind, ProviderHandle, SignInResult, UserId,
        UserIdentity,
    };
    pub use gatehouse_provider::{
        AuthEvent, DependencyStatus, IdentityProvider, MemoryProvider, ProfileUpdate,
        ProviderError,
    };
    pub use gatehouse_session::{
        ReconcilerConfig, SessionError, SessionReconciler, SessionState, SessionTransition,
    };
}
