//! The session reconciler: turns provider notifications into transitions.
//!
//! This is the central piece of the session layer. It's responsible for:
//! - Remembering the last known user per provider
//! - Ignoring notifications from providers it isn't tracking
//! - Collapsing duplicate notifications into nothing
//! - Emitting `SignedOut` before `SignedIn` when the user switches
//! - Keeping at most one token refresh in flight per provider
//!
//! # Concurrency note
//!
//! `SessionReconciler` is a plain synchronous reducer over `&mut self`. The
//! caller is expected to deliver both notification streams from a single
//! task (the facade's driver does exactly that), so there is no locking in
//! here at all.

use std::collections::HashMap;
use std::fmt;

use gatehouse_identity::{ProviderHandle, UserIdentity};

use crate::{
    RefreshTicket, ReconcilerConfig, SessionError, SessionRecord, SessionState, SessionTransition,
};

/// Derives the authoritative session from a provider's notifications.
///
/// ## Lifecycle
///
/// ```text
/// track(h) ──→ on_auth_state_notification(h, ..) ──→ [SignedIn / SignedOut / nothing]
///    │
///    ├──→ on_id_token_notification(h, ..) ──→ Some(ticket) ──→ complete_refresh(ticket, ..)
///    │                                    └─→ None (coalesced, foreign, or signed out)
///    ▼
/// untrack(h)   (records are kept; in-flight refreshes are released)
/// ```
pub struct SessionReconciler {
    /// One record per tracked provider ever observed. Never shrinks.
    records: HashMap<ProviderHandle, SessionRecord>,

    /// The single provider whose notifications are honored.
    tracked: Option<ProviderHandle>,

    /// Providers with a refresh in flight, mapped to the id of the ticket
    /// that holds the guard. Only that ticket can release it.
    refreshing: HashMap<ProviderHandle, u64>,

    next_ticket: u64,

    config: ReconcilerConfig,
}

impl SessionReconciler {
    /// Creates a reconciler that tracks nothing yet.
    pub fn new(config: ReconcilerConfig) -> Self {
        Self {
            records: HashMap::new(),
            tracked: None,
            refreshing: HashMap::new(),
            next_ticket: 1,
            config,
        }
    }

    /// Starts honoring notifications from `provider`.
    ///
    /// Tracking the same provider twice is a no-op.
    ///
    /// # Errors
    /// Returns [`SessionError::AlreadyTracking`] if a different provider is
    /// already tracked.
    pub fn track(&mut self, provider: ProviderHandle) -> Result<(), SessionError> {
        match self.tracked {
            Some(current) if current != provider => Err(SessionError::AlreadyTracking(current)),
            Some(_) => Ok(()),
            None => {
                self.tracked = Some(provider);
                tracing::debug!(%provider, "tracking provider");
                Ok(())
            }
        }
    }

    /// Stops honoring notifications from `provider`.
    ///
    /// The provider's record stays (it is process-lifetime state). Any
    /// refresh in flight for it is released; its ticket will be ignored
    /// when it comes back.
    ///
    /// # Errors
    /// Returns [`SessionError::NotTracked`] if `provider` isn't tracked.
    pub fn untrack(&mut self, provider: ProviderHandle) -> Result<(), SessionError> {
        if self.tracked != Some(provider) {
            return Err(SessionError::NotTracked(provider));
        }
        self.tracked = None;
        self.refreshing.remove(&provider);
        tracing::debug!(%provider, "stopped tracking provider");
        Ok(())
    }

    /// Handles an "auth state changed" notification.
    ///
    /// Returns the transitions it caused, in order. An empty vector means
    /// the notification changed nothing: it came from a provider that isn't
    /// tracked, or it reported the same user (or the same absence of one)
    /// as last time.
    ///
    /// Users are compared by identity ([`UserIdentity::same_user`]), so a
    /// profile edit on the signed-in account is not a transition.
    pub fn on_auth_state_notification(
        &mut self,
        sender: ProviderHandle,
        current_user: Option<&UserIdentity>,
    ) -> Vec<SessionTransition> {
        if self.tracked != Some(sender) {
            tracing::debug!(%sender, "ignoring state change from untracked provider");
            return Vec::new();
        }

        let record = self
            .records
            .entry(sender)
            .or_insert_with(|| SessionRecord::new(sender));

        if record.state.matches(current_user) {
            return Vec::new();
        }

        let mut transitions = Vec::with_capacity(2);

        // `replace` swaps the new state in and hands back the old one, so
        // the previous user is moved out instead of cloned.
        let previous = std::mem::replace(
            &mut record.state,
            SessionState::from(current_user.cloned()),
        );

        if let SessionState::Authenticated(previous) = previous {
            tracing::info!(provider = %sender, uid = %previous.uid, "signed out");
            transitions.push(SessionTransition::SignedOut(previous));
        }

        if let Some(user) = current_user {
            tracing::info!(provider = %sender, uid = %user.uid, name = user.label(), "signed in");
            if self.config.log_user_details {
                for line in user.detail_lines(1) {
                    tracing::debug!(provider = %sender, "{line}");
                }
            }
            transitions.push(SessionTransition::SignedIn(user.clone()));
        }

        record.transitions += transitions.len() as u64;
        transitions
    }

    /// Handles an "ID token changed" notification.
    ///
    /// Returns a ticket when a refresh should be issued now: the sender is
    /// the tracked provider, someone is signed in, and no refresh is
    /// already in flight for it. Otherwise returns `None`.
    ///
    /// Never changes session state. In particular a token notification
    /// does not imply that the matching state notification has been (or
    /// will be) seen; the two streams are independent.
    pub fn on_id_token_notification(
        &mut self,
        sender: ProviderHandle,
        current_user: Option<&UserIdentity>,
    ) -> Option<RefreshTicket> {
        if self.tracked != Some(sender) {
            tracing::debug!(%sender, "ignoring token change from untracked provider");
            return None;
        }
        let user = current_user?;
        if self.refreshing.contains_key(&sender) {
            tracing::debug!(provider = %sender, "token refresh already in flight");
            return None;
        }

        let id = self.next_ticket;
        self.next_ticket += 1;
        self.refreshing.insert(sender, id);

        Some(RefreshTicket {
            id,
            provider: sender,
            user: user.uid.clone(),
            force_refresh: self.config.force_refresh,
        })
    }

    /// Records the outcome of a refresh started with `ticket`.
    ///
    /// Always releases the in-flight guard, whatever the outcome. On
    /// success, returns the first `token_preview_len` characters of the
    /// token for diagnostic logging. On failure the error is logged and
    /// nothing else happens: no sign-out, no state change. The next token
    /// notification may try again.
    ///
    /// A ticket that no longer holds the guard (its provider was untracked
    /// in the meantime) is ignored.
    pub fn complete_refresh<E: fmt::Display>(
        &mut self,
        ticket: RefreshTicket,
        result: Result<String, E>,
    ) -> Option<String> {
        let provider = ticket.provider;
        if self.refreshing.get(&provider) != Some(&ticket.id) {
            tracing::debug!(
                %provider,
                ticket = ticket.id,
                "discarding stale refresh result"
            );
            return None;
        }
        self.refreshing.remove(&provider);

        match result {
            Ok(token) => {
                let preview: String = token.chars().take(self.config.token_preview_len).collect();
                tracing::info!(
                    %provider,
                    uid = %ticket.user,
                    "Token[0:{}] = {preview}",
                    self.config.token_preview_len
                );
                Some(preview)
            }
            Err(e) => {
                tracing::warn!(%provider, uid = %ticket.user, error = %e, "token refresh failed");
                None
            }
        }
    }

    /// The current state for `provider`. Providers never seen are
    /// `Anonymous`.
    pub fn state(&self, provider: &ProviderHandle) -> SessionState {
        self.records
            .get(provider)
            .map(|record| record.state.clone())
            .unwrap_or_default()
    }

    /// Looks up the record for `provider`, if one was ever created.
    pub fn record(&self, provider: &ProviderHandle) -> Option<&SessionRecord> {
        self.records.get(provider)
    }

    /// The provider currently being tracked, if any.
    pub fn tracked(&self) -> Option<ProviderHandle> {
        self.tracked
    }

    /// Returns `true` if a token refresh is in flight for `provider`.
    pub fn is_refreshing(&self, provider: &ProviderHandle) -> bool {
        self.refreshing.contains_key(provider)
    }

    /// Returns the number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record has been created yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }
}

impl Default for SessionReconciler {
    fn default() -> Self {
        Self::new(ReconcilerConfig::default())
    }
}

// =========================================================================
// Tests
// =========================================================================
