//! In-process identity provider.
//!
//! `MemoryProvider` behaves like a hosted auth service from the outside:
//! it validates credentials, keeps a signed-in user, hands out ID tokens,
//! and broadcasts [`AuthEvent`]s when the user changes. Everything lives in
//! memory, so it is meant for demos and tests, not production.
//!
//! Test hooks let callers inject failures ([`fail_token_fetches`]), slow
//! token fetches down ([`set_token_delay`]), and push raw notifications
//! ([`emit`]) to simulate duplicate or foreign events.
//!
//! [`fail_token_fetches`]: MemoryProvider::fail_token_fetches
//! [`set_token_delay`]: MemoryProvider::set_token_delay
//! [`emit`]: MemoryProvider::emit

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use gatehouse_identity::{
    AdditionalUserInfo, AuthErrorCode, ProviderHandle, ProviderInfo, SignInMetadata,
    SignInResult, UserIdentity,
};
use rand::Rng;
use rand::distr::Alphanumeric;
use tokio::sync::broadcast;

use crate::{
    AuthEvent, AuthEvents, DependencyStatus, IdentityProvider, ProfileUpdate, ProviderError,
};

/// Counter for generating unique provider handles.
static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Capacity of the event broadcast channel. Subscribers that fall further
/// behind than this see a lag error and must resync.
const EVENT_CAPACITY: usize = 64;

/// Reported as the issuing provider of every account.
const PROVIDER_ID: &str = "gatehouse-memory";

/// Shortest password accepted when creating an account.
const MIN_PASSWORD_LEN: usize = 6;

struct Account {
    password: String,
    user: UserIdentity,
    created_at: u64,
    last_sign_in: u64,
}

struct MemoryState {
    /// Accounts keyed by email.
    accounts: HashMap<String, Account>,
    current: Option<UserIdentity>,
    dependency_status: DependencyStatus,
    token_failure: Option<AuthErrorCode>,
    token_delay: Duration,
    token_fetches: u64,
}

/// An identity provider that keeps everything in memory.
pub struct MemoryProvider {
    handle: ProviderHandle,
    events: broadcast::Sender<AuthEvent>,
    state: Mutex<MemoryState>,
}

impl MemoryProvider {
    /// Creates an empty provider with a fresh, unique handle.
    pub fn new() -> Self {
        let handle = ProviderHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed));
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            handle,
            events,
            state: Mutex::new(MemoryState {
                accounts: HashMap::new(),
                current: None,
                dependency_status: DependencyStatus::Available,
                token_failure: None,
                token_delay: Duration::ZERO,
                token_fetches: 0,
            }),
        }
    }

    /// Registers an account without signing it in.
    ///
    /// Skips the password strength check so tests can seed whatever they
    /// like. Replaces any existing account with the same email.
    pub fn seed_account(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> UserIdentity {
        let mut user = new_user(email);
        user.display_name = display_name.map(str::to_string);
        let now = now_millis();
        self.lock().accounts.insert(
            email.to_string(),
            Account {
                password: password.to_string(),
                user: user.clone(),
                created_at: now,
                last_sign_in: now,
            },
        );
        user
    }

    /// Sets what [`check_dependencies`](IdentityProvider::check_dependencies)
    /// reports.
    pub fn set_dependency_status(&self, status: DependencyStatus) {
        self.lock().dependency_status = status;
    }

    /// Makes every token fetch fail with `code` until called again with
    /// `None`.
    pub fn fail_token_fetches(&self, code: Option<AuthErrorCode>) {
        self.lock().token_failure = code;
    }

    /// Delays every token fetch by `delay`.
    pub fn set_token_delay(&self, delay: Duration) {
        self.lock().token_delay = delay;
    }

    /// How many token fetches have been started so far.
    pub fn token_fetch_count(&self) -> u64 {
        self.lock().token_fetches
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    /// Broadcasts a raw event, exactly as given.
    ///
    /// Returns how many subscribers received it.
    pub fn emit(&self, event: AuthEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends the pair of events a hosted provider fires when the user
    /// changes: state first, then token.
    fn broadcast_user(&self, user: Option<UserIdentity>) {
        self.emit(AuthEvent::StateChanged {
            sender: self.handle,
            user: user.clone(),
        });
        self.emit(AuthEvent::IdTokenChanged {
            sender: self.handle,
            user,
        });
    }
}

impl Default for MemoryProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider for MemoryProvider {
    fn handle(&self) -> ProviderHandle {
        self.handle
    }

    fn current_user(&self) -> Option<UserIdentity> {
        self.lock().current.clone()
    }

    fn subscribe(&self) -> AuthEvents {
        self.events.subscribe()
    }

    async fn check_dependencies(&self) -> DependencyStatus {
        self.lock().dependency_status
    }

    async fn fetch_token(&self, force_refresh: bool) -> Result<String, ProviderError> {
        let (delay, failure) = {
            let mut state = self.lock();
            if state.current.is_none() {
                return Err(ProviderError::NotSignedIn);
            }
            state.token_fetches += 1;
            (state.token_delay, state.token_failure)
        };

        tracing::debug!(provider = %self.handle, force_refresh, "fetching token");

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match failure {
            Some(code) => Err(ProviderError::auth(code, "token fetch failed")),
            None => Ok(generate_token()),
        }
    }

    async fn sign_in_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignInResult, ProviderError> {
        check_credentials(email, password)?;

        let result = {
            let mut state = self.lock();
            let account = state.accounts.get_mut(email).ok_or_else(|| {
                ProviderError::auth(AuthErrorCode::UserNotFound, "no account for this email")
            })?;
            if account.password != password {
                return Err(ProviderError::auth(
                    AuthErrorCode::WrongPassword,
                    "password does not match",
                ));
            }

            let previous_sign_in = account.last_sign_in;
            account.last_sign_in = now_millis();
            let result = SignInResult {
                user: account.user.clone(),
                meta: Some(SignInMetadata {
                    creation_timestamp: account.created_at,
                    last_sign_in_timestamp: previous_sign_in,
                }),
                info: Some(AdditionalUserInfo {
                    user_name: account.user.display_name.clone(),
                    provider_id: "password".into(),
                    profile: Default::default(),
                }),
            };
            state.current = Some(result.user.clone());
            result
        };

        tracing::debug!(provider = %self.handle, uid = %result.user.uid, "signed in");
        self.broadcast_user(Some(result.user.clone()));
        Ok(result)
    }

    async fn create_user_with_email(
        &self,
        email: &str,
        password: &str,
    ) -> Result<UserIdentity, ProviderError> {
        check_credentials(email, password)?;
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ProviderError::auth(
                AuthErrorCode::WeakPassword,
                format!("password must be at least {MIN_PASSWORD_LEN} characters"),
            ));
        }

        let user = {
            let mut state = self.lock();
            if state.accounts.contains_key(email) {
                return Err(ProviderError::auth(
                    AuthErrorCode::EmailAlreadyInUse,
                    "an account already exists for this email",
                ));
            }
            let user = new_user(email);
            let now = now_millis();
            state.accounts.insert(
                email.to_string(),
                Account {
                    password: password.to_string(),
                    user: user.clone(),
                    created_at: now,
                    last_sign_in: now,
                },
            );
            state.current = Some(user.clone());
            user
        };

        tracing::debug!(provider = %self.handle, uid = %user.uid, "account created");
        self.broadcast_user(Some(user.clone()));
        Ok(user)
    }

    async fn update_profile(&self, update: ProfileUpdate) -> Result<(), ProviderError> {
        let mut state = self.lock();
        let mut user = state.current.clone().ok_or(ProviderError::NotSignedIn)?;
        if let Some(name) = update.display_name {
            user.display_name = Some(name);
        }
        if let Some(url) = update.photo_url {
            user.photo_url = Some(url);
        }
        if let Some(account) = user
            .email
            .as_deref()
            .and_then(|email| state.accounts.get_mut(email))
        {
            account.user = user.clone();
        }
        state.current = Some(user);
        Ok(())
    }

    fn sign_out(&self) {
        let previous = self.lock().current.take();
        if let Some(user) = previous {
            tracing::debug!(provider = %self.handle, uid = %user.uid, "signed out");
            self.broadcast_user(None);
        }
    }
}

/// The checks a hosted provider runs before looking at the account.
fn check_credentials(email: &str, password: &str) -> Result<(), ProviderError> {
    if email.is_empty() {
        return Err(ProviderError::auth(AuthErrorCode::MissingEmail, "email is empty"));
    }
    if password.is_empty() {
        return Err(ProviderError::auth(
            AuthErrorCode::MissingPassword,
            "password is empty",
        ));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ProviderError::auth(
            AuthErrorCode::InvalidEmail,
            "email is badly formatted",
        )),
    }
}

fn new_user(email: &str) -> UserIdentity {
    let mut user = UserIdentity::new(generate_uid()).with_email(email);
    user.provider_id = PROVIDER_ID.into();
    user.provider_data.push(ProviderInfo {
        provider_id: "password".into(),
        user_id: email.to_string(),
        email: Some(email.to_string()),
        ..ProviderInfo::default()
    });
    user
}

/// 28 alphanumeric characters, the same shape hosted providers use.
fn generate_uid() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(28)
        .map(char::from)
        .collect()
}

/// 32 random bytes as hex. Opaque to everyone but the provider.
fn generate_token() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
