//! Sign-in and sign-up forms.
//!
//! A form is the logic behind one screen: it takes what the user typed,
//! calls the identity provider, and turns provider failures into a message
//! under the right input field. While a request is in flight the form is
//! [`FormStatus::Busy`] and the UI should disable its inputs.
//!
//! ```text
//!          submit()               provider ok
//!   Idle ───────────→ Busy ──────────────────→ Idle
//!    ↑                  │
//!    │                  │ provider error
//!    │   submit()       ↓
//!    └──────────── Failed(FieldMessage)
//! ```
//!
//! Forms never navigate after a successful sign-in or sign-out. The
//! provider's notification reaches the session driver, and the driver
//! picks the next view.

use std::sync::Arc;

use gatehouse_identity::{AuthErrorCode, FieldMessage, FormKind, SignInResult, UserIdentity};
use gatehouse_provider::{IdentityProvider, ProfileUpdate, ProviderError};
use tokio::sync::watch;

use crate::{Navigator, View};

/// What the form's UI should currently show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormStatus {
    /// Inputs enabled, no message.
    #[default]
    Idle,
    /// A request is in flight; inputs disabled.
    Busy,
    /// The last submission failed; show the message under its field.
    Failed(FieldMessage),
}

impl FormStatus {
    /// Whether the inputs and buttons should accept interaction.
    pub fn is_interactive(&self) -> bool {
        !matches!(self, Self::Busy)
    }

    /// The message to display, if any.
    pub fn message(&self) -> Option<&FieldMessage> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }
}

/// Errors returned by form submissions.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// A previous submission has not finished yet.
    #[error("a submission is already in progress")]
    Busy,

    /// The input was rejected before reaching the provider.
    #[error("{0}")]
    Rejected(FieldMessage),

    /// The provider refused the request. `message` is what the user sees.
    #[error("{message}")]
    Provider {
        message: FieldMessage,
        #[source]
        source: ProviderError,
    },
}

impl FormError {
    /// The message to show under the form, if there is one.
    pub fn message(&self) -> Option<&FieldMessage> {
        match self {
            Self::Busy => None,
            Self::Rejected(message) | Self::Provider { message, .. } => Some(message),
        }
    }
}

/// Resets a form from `Busy` back to `Idle` when the submission ends,
/// however it ends. A `Failed` status set before the drop is kept.
struct BusyGuard<'a> {
    status: &'a watch::Sender<FormStatus>,
}

impl<'a> BusyGuard<'a> {
    fn acquire(status: &'a watch::Sender<FormStatus>) -> Result<Self, FormError> {
        let acquired = status.send_if_modified(|current| {
            if *current == FormStatus::Busy {
                return false;
            }
            *current = FormStatus::Busy;
            true
        });
        if acquired {
            Ok(Self { status })
        } else {
            Err(FormError::Busy)
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.status.send_if_modified(|current| {
            if *current != FormStatus::Busy {
                return false;
            }
            *current = FormStatus::Idle;
            true
        });
    }
}

/// Logs a failed provider request the way every form does, and records
/// the resulting message as the form's status.
fn fail(
    status: &watch::Sender<FormStatus>,
    operation: &str,
    form: FormKind,
    err: ProviderError,
) -> FormError {
    match &err {
        ProviderError::Cancelled => tracing::info!("{operation} canceled"),
        _ => tracing::info!(error = %err, "{operation} encountered an error"),
    }
    let message = err
        .code()
        .unwrap_or(AuthErrorCode::Other(0))
        .field_message(form);
    status.send_replace(FormStatus::Failed(message.clone()));
    FormError::Provider {
        message,
        source: err,
    }
}

/// The sign-in screen.
pub struct SignInForm<P: IdentityProvider> {
    provider: Arc<P>,
    status: watch::Sender<FormStatus>,
    show_profile_details: bool,
}

impl<P: IdentityProvider> SignInForm<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            status: watch::Sender::new(FormStatus::Idle),
            show_profile_details: true,
        }
    }

    /// Whether a successful sign-in logs the full result (metadata and
    /// additional user info) or just the user's name. On by default.
    pub fn with_profile_details(mut self, enabled: bool) -> Self {
        self.show_profile_details = enabled;
        self
    }

    pub fn status(&self) -> FormStatus {
        self.status.borrow().clone()
    }

    /// Subscribes to status changes, e.g. to toggle the inputs.
    pub fn watch_status(&self) -> watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    /// Signs in with the given credentials.
    ///
    /// # Errors
    /// - [`FormError::Busy`] if a sign-in is already in flight
    /// - [`FormError::Provider`] with the sign-in screen's message for the
    ///   provider's error code
    pub async fn submit(&self, email: &str, password: &str) -> Result<SignInResult, FormError> {
        let _busy = BusyGuard::acquire(&self.status)?;
        tracing::info!("Attempting to sign in as {email}...");

        let result = self
            .provider
            .sign_in_with_email(email, password)
            .await
            .map_err(|e| fail(&self.status, "Sign-in", FormKind::SignIn, e))?;

        tracing::info!("Sign-in completed");
        if self.show_profile_details {
            for line in result.detail_lines(1) {
                tracing::debug!("{line}");
            }
        } else {
            tracing::info!("{} signed in", result.user.label());
        }
        Ok(result)
    }

    /// The "create account" button.
    pub fn open_sign_up(&self, navigator: &impl Navigator) {
        navigator.navigate(View::SignUp);
    }
}

/// The sign-up screen.
pub struct SignUpForm<P: IdentityProvider> {
    provider: Arc<P>,
    status: watch::Sender<FormStatus>,
    display_name: Option<String>,
}

impl<P: IdentityProvider> SignUpForm<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self {
            provider,
            status: watch::Sender::new(FormStatus::Idle),
            display_name: None,
        }
    }

    /// A display name to set on the new account once it is created.
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        self.display_name = (!name.is_empty()).then_some(name);
        self
    }

    pub fn status(&self) -> FormStatus {
        self.status.borrow().clone()
    }

    pub fn watch_status(&self) -> watch::Receiver<FormStatus> {
        self.status.subscribe()
    }

    /// Creates an account and signs it in.
    ///
    /// If a display name was configured it is applied after the account
    /// exists. A failed profile update is logged and does not fail the
    /// sign-up; the returned identity then carries no display name.
    ///
    /// # Errors
    /// - [`FormError::Busy`] if a sign-up is already in flight
    /// - [`FormError::Rejected`] if `password` and `confirm` differ; the
    ///   provider is not called
    /// - [`FormError::Provider`] with the sign-up screen's message
    pub async fn submit(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<UserIdentity, FormError> {
        let _busy = BusyGuard::acquire(&self.status)?;

        if password != confirm {
            let message = FieldMessage::password("Passwords do not match.");
            self.status.send_replace(FormStatus::Failed(message.clone()));
            return Err(FormError::Rejected(message));
        }

        tracing::info!("Attempting to create user {email}...");
        let mut user = self
            .provider
            .create_user_with_email(email, password)
            .await
            .map_err(|e| fail(&self.status, "User Creation", FormKind::SignUp, e))?;
        tracing::info!(uid = %user.uid, "User Creation completed");

        if let Some(name) = &self.display_name {
            tracing::info!("Updating user profile {name}");
            let update = ProfileUpdate {
                display_name: Some(name.clone()),
                photo_url: user.photo_url.clone(),
            };
            match self.provider.update_profile(update).await {
                Ok(()) => user.display_name = Some(name.clone()),
                Err(e) => tracing::warn!(uid = %user.uid, error = %e, "profile update failed"),
            }
        }

        Ok(user)
    }

    /// The "back" button.
    pub fn back(&self, navigator: &impl Navigator) {
        navigator.navigate(View::SignIn);
    }
}

/// The sign-out button.
pub fn sign_out<P: IdentityProvider>(provider: &P) {
    tracing::info!(provider = %provider.handle(), "signing out");
    provider.sign_out();
}
