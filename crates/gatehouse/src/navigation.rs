//! Views and the collaborator that switches between them.

use std::fmt;

use gatehouse_session::SessionTransition;
use tokio::sync::mpsc;

/// The screens the authentication flow moves between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    SignIn,
    SignUp,
    /// The authenticated part of the game.
    Main,
}

impl View {
    /// The scene name the client's scene manager loads for this view.
    pub fn scene_name(self) -> &'static str {
        match self {
            Self::SignIn => "SignInScene",
            Self::SignUp => "SignUpScene",
            Self::Main => "MainScene",
        }
    }

    /// Where a session transition sends the user.
    pub fn after(transition: &SessionTransition) -> Self {
        match transition {
            SessionTransition::SignedIn(_) => Self::Main,
            SessionTransition::SignedOut(_) => Self::SignIn,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scene_name())
    }
}

/// Switches the visible view.
///
/// Called from the session driver's task, so implementations must be
/// `Send + 'static` and must not block.
pub trait Navigator: Send + 'static {
    fn navigate(&self, view: View);
}

/// A [`Navigator`] that forwards every view to a channel.
///
/// The receiving end is typically the UI loop, or a test asserting on the
/// exact sequence of views.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    sender: mpsc::UnboundedSender<View>,
}

impl ChannelNavigator {
    /// Creates a navigator and the receiver its views arrive on.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<View>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Navigator for ChannelNavigator {
    fn navigate(&self, view: View) {
        // A closed receiver means the UI is gone; nothing left to switch.
        let _ = self.sender.send(view);
    }
}
