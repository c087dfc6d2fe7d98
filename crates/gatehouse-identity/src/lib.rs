//! Identity types for Gatehouse.
//!
//! This crate defines the values that flow out of an identity provider and
//! through the rest of the stack:
//!
//! - **Identity** ([`ProviderHandle`], [`UserId`], [`UserIdentity`],
//!   [`ProviderInfo`]) — who is signed in, and with which provider client.
//! - **Sign-in results** ([`SignInResult`], [`SignInMetadata`],
//!   [`AdditionalUserInfo`]) — what an email sign-in hands back.
//! - **Error codes** ([`AuthErrorCode`], [`FieldMessage`]) — the provider's
//!   failure codes and the form messages they map to.
//!
//! # Architecture
//!
//! The identity layer knows nothing about events, sessions, or screens.
//! It only describes values; the layers above decide what to do with them.
//!
//! ```text
//! Provider (events) → Session (transitions) → Facade (views, forms)
//!        ╰──────────── all speak Identity ────────────╯
//! ```

mod error_code;
mod profile;
mod types;

pub use error_code::{AuthErrorCode, FieldMessage, FormField, FormKind};
pub use profile::{AdditionalUserInfo, SignInMetadata, SignInResult};
pub use types::{ProviderHandle, ProviderInfo, UserId, UserIdentity};
