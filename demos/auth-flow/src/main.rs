use std::sync::Arc;

use gatehouse::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;

// ---------------------------------------------------------------------------
// Screens
// ---------------------------------------------------------------------------

/// Stands in for the scene manager: remembers every view it was asked to
/// show and lets the script wait for a particular one.
struct Screens {
    views: UnboundedReceiver<View>,
    history: Vec<View>,
}

impl Screens {
    async fn wait_for(&mut self, wanted: View) -> Result<(), GatehouseError> {
        while let Some(view) = self.views.recv().await {
            eprintln!("  -> {view}");
            self.history.push(view);
            if view == wanted {
                return Ok(());
            }
        }
        Err(GatehouseError::Detached)
    }
}

fn show(result: Result<impl std::fmt::Debug, FormError>) {
    match result {
        Ok(_) => {}
        Err(err) => match err.message() {
            Some(message) => eprintln!("  [{:?}] {message}", message.field),
            None => eprintln!("  {err}"),
        },
    }
}

// ---------------------------------------------------------------------------
// Scripted session
// ---------------------------------------------------------------------------

/// Clicks through sign-up, sign-out and sign-in the way a player would,
/// including a few typos. Returns every view that was shown.
async fn play(provider: Arc<MemoryProvider>) -> Result<Vec<View>, GatehouseError> {
    let (navigator, views) = ChannelNavigator::new();
    let mut screens = Screens {
        views,
        history: Vec::new(),
    };

    let attachment = SessionDriverBuilder::new()
        .attach(Arc::clone(&provider), navigator.clone())
        .await?;
    screens.wait_for(View::SignIn).await?;

    let sign_in = SignInForm::new(Arc::clone(&provider));
    let sign_up = SignUpForm::new(Arc::clone(&provider)).with_display_name("Ada");

    eprintln!("create account");
    sign_in.open_sign_up(&navigator);
    screens.wait_for(View::SignUp).await?;

    show(sign_up.submit("ada@example.com", "secret1", "secret2").await);
    show(sign_up.submit("ada@example.com", "abc", "abc").await);
    let user = sign_up.submit("ada@example.com", "secret1", "secret1").await?;
    tracing::info!(uid = %user.uid, "welcome, {}", user.label());
    screens.wait_for(View::Main).await?;

    eprintln!("sign out");
    sign_out(provider.as_ref());
    screens.wait_for(View::SignIn).await?;

    eprintln!("sign back in");
    show(sign_in.submit("ada@example.com", "secret").await);
    let result = sign_in.submit("ada@example.com", "secret1").await?;
    tracing::info!(uid = %result.user.uid, "welcome back, {}", result.user.label());
    screens.wait_for(View::Main).await?;

    attachment.detach().await?;
    Ok(screens.history)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    gatehouse::init_tracing();
    eprintln!("starting auth flow against an in-memory provider");

    let history = play(Arc::new(MemoryProvider::new())).await?;

    let names: Vec<&str> = history.iter().map(|view| view.scene_name()).collect();
    eprintln!("views shown: {}", names.join(" -> "));
    Ok(())
}
