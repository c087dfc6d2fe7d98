//! The log lines the reconciler writes for transitions and refreshes.
//!
//! Each test installs a capturing subscriber for its own thread only, so
//! the reconciler's output can be asserted on directly.

use std::io;
use std::sync::{Arc, Mutex};

use gatehouse_identity::{ProviderHandle, UserIdentity};
use gatehouse_session::{ReconcilerConfig, SessionError, SessionReconciler};
use tracing_subscriber::fmt::MakeWriter;

// =========================================================================
// Helpers
// =========================================================================

const H: ProviderHandle = ProviderHandle(1);

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Runs `f` with a debug-level subscriber and returns everything it logged.
fn captured(f: impl FnOnce()) -> String {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    let bytes = logs.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

fn tracking() -> SessionReconciler {
    let mut rec = SessionReconciler::new(ReconcilerConfig::default());
    rec.track(H).unwrap();
    rec
}

fn line_with<'a>(output: &'a str, needle: &str) -> &'a str {
    output
        .lines()
        .find(|line| line.contains(needle))
        .unwrap_or_else(|| panic!("no line containing {needle:?} in:\n{output}"))
}

// =========================================================================
// Transitions
// =========================================================================

#[test]
fn test_user_switch_logs_sign_out_then_sign_in_with_uids() {
    let mut rec = tracking();
    let _ = rec.on_auth_state_notification(H, Some(&UserIdentity::new("A")));

    let output = captured(|| {
        let _ = rec.on_auth_state_notification(H, Some(&UserIdentity::new("B")));
    });

    let signed_out = line_with(&output, "signed out");
    assert!(signed_out.contains("INFO"));
    assert!(signed_out.contains("uid=A"));
    let signed_in = line_with(&output, "signed in");
    assert!(signed_in.contains("uid=B"));
    assert!(output.find("signed out") < output.find("signed in"));
}

#[test]
fn test_signed_in_user_details_logged_at_debug() {
    let mut rec = tracking();
    let user = UserIdentity::new("A").with_email("ada@example.com");

    let output = captured(|| {
        let _ = rec.on_auth_state_notification(H, Some(&user));
    });

    assert!(line_with(&output, "Email: ada@example.com").contains("DEBUG"));
}

#[test]
fn test_user_details_omitted_when_disabled() {
    let mut rec = SessionReconciler::new(ReconcilerConfig {
        log_user_details: false,
        ..ReconcilerConfig::default()
    });
    rec.track(H).unwrap();
    let user = UserIdentity::new("A").with_email("ada@example.com");

    let output = captured(|| {
        let _ = rec.on_auth_state_notification(H, Some(&user));
    });

    assert!(output.contains("signed in"));
    assert!(!output.contains("Email: ada@example.com"));
}

// =========================================================================
// Refresh completions
// =========================================================================

#[test]
fn test_successful_refresh_logs_token_preview() {
    let mut rec = tracking();
    let ticket = rec
        .on_id_token_notification(H, Some(&UserIdentity::new("A")))
        .unwrap();

    let output = captured(|| {
        let _ = rec.complete_refresh(ticket, Ok::<_, SessionError>("0123456789abcdef".into()));
    });

    let line = line_with(&output, "Token[0:8] = 01234567");
    assert!(line.contains("INFO"));
    assert!(!output.contains("89abcdef"), "only the preview is logged");
}

#[test]
fn test_failed_refresh_logs_warning_with_error() {
    let mut rec = tracking();
    let ticket = rec
        .on_id_token_notification(H, Some(&UserIdentity::new("A")))
        .unwrap();

    let output = captured(|| {
        let _ = rec.complete_refresh(
            ticket,
            Err(SessionError::RefreshFailed("network unreachable".into())),
        );
    });

    let line = line_with(&output, "token refresh failed");
    assert!(line.contains("WARN"));
    assert!(line.contains("network unreachable"));
}
