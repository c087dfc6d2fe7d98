//! Session driver: the single task that owns the reconciler.
//!
//! The identity provider delivers its notifications from wherever it likes.
//! The driver marshals them onto one Tokio task, feeds them to a
//! [`SessionReconciler`], turns the resulting transitions into navigation,
//! and runs token refreshes on the side. This is the "actor model" again:
//! the reconciler is owned by exactly one task and the outside world talks
//! to it through channels.
//!
//! ```text
//! provider events ──┐
//! refresh results ──┼──→ [driver task] ──→ SessionReconciler ──→ Navigator
//! commands ─────────┘          │
//!                              └──→ spawned refresh ──→ (refresh results)
//! ```

use std::sync::Arc;

use gatehouse_identity::ProviderHandle;
use gatehouse_provider::{AuthEvent, AuthEvents, IdentityProvider, ProviderError};
use gatehouse_session::{
    RefreshTicket, ReconcilerConfig, SessionError, SessionReconciler, SessionState,
    SessionTransition, TokenRefresher,
};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;

use crate::tokens::ProviderTokens;
use crate::{GatehouseError, Navigator, View};

/// Default command channel size for the driver task.
const DEFAULT_CHANNEL_SIZE: usize = 64;

/// Builder for attaching a session driver to a provider.
///
/// # Example
///
/// ```rust,no_run
/// use std::sync::Arc;
///
/// use gatehouse::prelude::*;
///
/// # async fn run() -> Result<(), GatehouseError> {
/// let provider = Arc::new(MemoryProvider::new());
/// let (navigator, mut views) = ChannelNavigator::new();
///
/// let attachment = SessionDriverBuilder::new()
///     .config(ReconcilerConfig::default())
///     .attach(provider, navigator)
///     .await?;
///
/// assert_eq!(views.recv().await, Some(View::SignIn));
/// attachment.detach().await?;
/// # Ok(())
/// # }
/// ```
pub struct SessionDriverBuilder {
    config: ReconcilerConfig,
    channel_size: usize,
}

impl SessionDriverBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            config: ReconcilerConfig::default(),
            channel_size: DEFAULT_CHANNEL_SIZE,
        }
    }

    /// Sets the reconciler configuration.
    pub fn config(mut self, config: ReconcilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the size of the command channel.
    pub fn channel_size(mut self, size: usize) -> Self {
        self.channel_size = size.max(1);
        self
    }

    /// Checks the provider, subscribes to it, and spawns the driver task.
    ///
    /// The driver starts by replaying the provider's current user, so an
    /// already-restored session navigates straight to [`View::Main`]. If
    /// nobody is signed in the first view is [`View::SignIn`].
    ///
    /// # Errors
    /// Returns [`ProviderError::Unavailable`] (wrapped) if the provider's
    /// dependencies are not available. Nothing is subscribed in that case.
    pub async fn attach<P, N>(
        self,
        provider: Arc<P>,
        navigator: N,
    ) -> Result<Attachment, GatehouseError>
    where
        P: IdentityProvider,
        N: Navigator,
    {
        let handle = provider.handle();

        let status = provider.check_dependencies().await;
        if !status.is_available() {
            tracing::error!(provider = %handle, %status, "could not resolve provider dependencies");
            return Err(ProviderError::Unavailable(status).into());
        }

        // Subscribe before reading the current user so nothing that happens
        // in between is lost. Anything seen twice is a no-op downstream.
        let events = provider.subscribe();

        let mut reconciler = SessionReconciler::new(self.config);
        reconciler.track(handle)?;

        let (cmd_tx, cmd_rx) = mpsc::channel(self.channel_size);

        let actor = DriverActor {
            handle,
            refresher: Arc::new(ProviderTokens::new(Arc::clone(&provider))),
            provider,
            navigator,
            reconciler,
            events,
            commands: cmd_rx,
            refreshes: JoinSet::new(),
        };

        tokio::spawn(actor.run());

        tracing::info!(provider = %handle, "session driver attached");
        Ok(Attachment {
            provider: handle,
            sender: cmd_tx,
        })
    }
}

impl Default for SessionDriverBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Commands sent to the driver task.
enum DriverCommand {
    /// Request the current session state.
    Session {
        reply: oneshot::Sender<SessionState>,
    },

    /// Ask whether a token refresh is in flight.
    IsRefreshing { reply: oneshot::Sender<bool> },

    /// Unsubscribe and stop. `reply` fires once the subscription is gone.
    Detach { reply: Option<oneshot::Sender<()>> },
}

/// A finished token refresh, handed back to the driver task.
struct RefreshDone {
    ticket: RefreshTicket,
    result: Result<String, SessionError>,
}

/// Scoped handle to a running session driver.
///
/// Releasing it detaches the driver from the provider: either explicitly
/// with [`detach`](Self::detach), which waits until the subscription is
/// gone, or implicitly on drop, which only sends the request.
pub struct Attachment {
    provider: ProviderHandle,
    sender: mpsc::Sender<DriverCommand>,
}

impl Attachment {
    /// The provider this driver is attached to.
    pub fn provider(&self) -> ProviderHandle {
        self.provider
    }

    /// The current session state as the driver sees it.
    pub async fn session(&self) -> Result<SessionState, GatehouseError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DriverCommand::Session { reply: reply_tx })
            .await
            .map_err(|_| GatehouseError::Detached)?;
        reply_rx.await.map_err(|_| GatehouseError::Detached)
    }

    /// Returns `true` if a token refresh is currently in flight.
    pub async fn is_refreshing(&self) -> Result<bool, GatehouseError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(DriverCommand::IsRefreshing { reply: reply_tx })
            .await
            .map_err(|_| GatehouseError::Detached)?;
        reply_rx.await.map_err(|_| GatehouseError::Detached)
    }

    /// Detaches from the provider and waits until the driver has
    /// unsubscribed and released its provider reference.
    ///
    /// Detaching a driver that already stopped (its provider went away)
    /// succeeds.
    pub async fn detach(self) -> Result<(), GatehouseError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        if self
            .sender
            .send(DriverCommand::Detach {
                reply: Some(reply_tx),
            })
            .await
            .is_err()
        {
            return Ok(());
        }
        // A dropped reply means the task ended on its own; either way the
        // subscription is gone.
        let _ = reply_rx.await;
        Ok(())
    }
}

impl Drop for Attachment {
    fn drop(&mut self) {
        // Fails harmlessly after `detach` or when the queue is full; the
        // task also stops once every sender is gone.
        let _ = self.sender.try_send(DriverCommand::Detach { reply: None });
    }
}

/// The driver task state.
struct DriverActor<P: IdentityProvider, N: Navigator> {
    handle: ProviderHandle,
    provider: Arc<P>,
    refresher: Arc<ProviderTokens<P>>,
    navigator: N,
    reconciler: SessionReconciler,
    events: AuthEvents,
    commands: mpsc::Receiver<DriverCommand>,
    /// In-flight token refreshes. Owned here so detach can wait for them.
    refreshes: JoinSet<RefreshDone>,
}

impl<P: IdentityProvider, N: Navigator> DriverActor<P, N> {
    /// Runs the driver loop until detached or the provider goes away.
    async fn run(mut self) {
        tracing::info!(provider = %self.handle, "session driver started");

        let transitions = self.resync();
        if transitions.is_empty() && !self.reconciler.state(&self.handle).is_authenticated() {
            self.navigator.navigate(View::SignIn);
        }

        let mut detach_reply = None;

        loop {
            tokio::select! {
                event = self.events.recv() => match event {
                    Ok(event) => self.handle_event(event),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(
                            provider = %self.handle,
                            missed,
                            "fell behind provider events, resyncing"
                        );
                        self.resync();
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!(provider = %self.handle, "provider event stream closed");
                        break;
                    }
                },
                Some(joined) = self.refreshes.join_next() => match joined {
                    Ok(done) => {
                        self.reconciler.complete_refresh(done.ticket, done.result);
                    }
                    Err(e) => {
                        tracing::warn!(provider = %self.handle, error = %e, "token refresh task failed");
                    }
                },
                cmd = self.commands.recv() => match cmd {
                    Some(DriverCommand::Session { reply }) => {
                        let _ = reply.send(self.reconciler.state(&self.handle));
                    }
                    Some(DriverCommand::IsRefreshing { reply }) => {
                        let _ = reply.send(self.reconciler.is_refreshing(&self.handle));
                    }
                    Some(DriverCommand::Detach { reply }) => {
                        detach_reply = reply;
                        break;
                    }
                    None => break,
                },
            }
        }

        self.shutdown().await;
        if let Some(reply) = detach_reply {
            let _ = reply.send(());
        }
    }

    fn handle_event(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::StateChanged { sender, user } => {
                let transitions = self
                    .reconciler
                    .on_auth_state_notification(sender, user.as_ref());
                self.navigate(&transitions);
            }
            AuthEvent::IdTokenChanged { sender, user } => {
                if let Some(ticket) = self.reconciler.on_id_token_notification(sender, user.as_ref())
                {
                    self.spawn_refresh(ticket);
                }
            }
        }
    }

    /// Replays the provider's current user through both paths, as if the
    /// provider had just sent a state change and a token change.
    fn resync(&mut self) -> Vec<SessionTransition> {
        let current = self.provider.current_user();
        let transitions = self
            .reconciler
            .on_auth_state_notification(self.handle, current.as_ref());
        self.navigate(&transitions);
        if let Some(ticket) = self
            .reconciler
            .on_id_token_notification(self.handle, current.as_ref())
        {
            self.spawn_refresh(ticket);
        }
        transitions
    }

    fn navigate(&self, transitions: &[SessionTransition]) {
        for transition in transitions {
            let view = View::after(transition);
            tracing::debug!(provider = %self.handle, %view, "navigating");
            self.navigator.navigate(view);
        }
    }

    /// Runs the refresh on its own task. The result is joined back in
    /// `run`, so the reconciler is only ever touched from the driver task.
    fn spawn_refresh(&mut self, ticket: RefreshTicket) {
        let refresher = Arc::clone(&self.refresher);
        self.refreshes.spawn(async move {
            let result = refresher
                .refresh_token(ticket.provider(), ticket.force_refresh())
                .await;
            RefreshDone { ticket, result }
        });
    }

    /// Unsubscribes, settles in-flight refreshes, untracks, and only then
    /// lets go of the provider.
    async fn shutdown(self) {
        let Self {
            handle,
            provider,
            refresher,
            mut reconciler,
            events,
            mut refreshes,
            ..
        } = self;

        drop(events);

        // Aborted tasks drop their provider reference before `join_next`
        // reports them. A refresh that finished in the meantime is still
        // completed normally.
        refreshes.abort_all();
        while let Some(joined) = refreshes.join_next().await {
            match joined {
                Ok(done) => {
                    reconciler.complete_refresh(done.ticket, done.result);
                }
                Err(e) if e.is_cancelled() => {
                    tracing::info!(provider = %handle, "token refresh abandoned on detach");
                }
                Err(e) => {
                    tracing::warn!(provider = %handle, error = %e, "token refresh task failed");
                }
            }
        }

        let _ = reconciler.untrack(handle);
        drop(refresher);
        drop(provider);

        tracing::info!(provider = %handle, "session driver detached");
    }
}
