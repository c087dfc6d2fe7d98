//! Integration tests for the in-memory identity provider.

use std::time::Duration;

use gatehouse_identity::{AuthErrorCode, UserIdentity};
use gatehouse_provider::{
    AuthEvent, DependencyStatus, IdentityProvider, MemoryProvider, ProfileUpdate, ProviderError,
};

// =========================================================================
// Helpers
// =========================================================================

fn code_of<T: std::fmt::Debug>(result: Result<T, ProviderError>) -> Option<AuthErrorCode> {
    result.expect_err("expected an error").code()
}

// =========================================================================
// Sign-up
// =========================================================================

#[tokio::test]
async fn test_create_user_signs_in_and_broadcasts_both_events() {
    let provider = MemoryProvider::new();
    let mut events = provider.subscribe();

    let user = provider
        .create_user_with_email("ada@example.com", "secret1")
        .await
        .expect("sign-up should succeed");

    assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    assert_eq!(user.provider_id, "gatehouse-memory");
    assert!(user.detail_lines(0).contains(&"Provider ID: gatehouse-memory".to_string()));
    assert_eq!(provider.current_user(), Some(user.clone()));

    let first = events.recv().await.unwrap();
    let second = events.recv().await.unwrap();
    assert_eq!(
        first,
        AuthEvent::StateChanged {
            sender: provider.handle(),
            user: Some(user.clone()),
        }
    );
    assert_eq!(
        second,
        AuthEvent::IdTokenChanged {
            sender: provider.handle(),
            user: Some(user),
        }
    );
}

#[tokio::test]
async fn test_create_user_rejects_weak_password() {
    let provider = MemoryProvider::new();

    let result = provider.create_user_with_email("ada@example.com", "123").await;

    assert_eq!(code_of(result), Some(AuthErrorCode::WeakPassword));
    assert!(provider.current_user().is_none());
}

#[tokio::test]
async fn test_create_user_rejects_duplicate_email() {
    let provider = MemoryProvider::new();
    provider.seed_account("ada@example.com", "secret1", None);

    let result = provider.create_user_with_email("ada@example.com", "secret2").await;

    assert_eq!(code_of(result), Some(AuthErrorCode::EmailAlreadyInUse));
}

// =========================================================================
// Sign-in
// =========================================================================

#[tokio::test]
async fn test_sign_in_returns_metadata_and_sets_current_user() {
    let provider = MemoryProvider::new();
    let seeded = provider.seed_account("ada@example.com", "secret1", Some("Ada"));

    let result = provider
        .sign_in_with_email("ada@example.com", "secret1")
        .await
        .expect("sign-in should succeed");

    assert!(result.user.same_user(&seeded));
    assert!(result.meta.is_some());
    let info = result.info.expect("info should be present");
    assert_eq!(info.provider_id, "password");
    assert_eq!(info.user_name.as_deref(), Some("Ada"));
    assert_eq!(provider.current_user().map(|u| u.uid), Some(seeded.uid));
}

#[tokio::test]
async fn test_sign_in_wrong_password_and_unknown_user() {
    let provider = MemoryProvider::new();
    provider.seed_account("ada@example.com", "secret1", None);

    let wrong = provider.sign_in_with_email("ada@example.com", "nope").await;
    let unknown = provider.sign_in_with_email("bob@example.com", "secret1").await;

    assert_eq!(code_of(wrong), Some(AuthErrorCode::WrongPassword));
    assert_eq!(code_of(unknown), Some(AuthErrorCode::UserNotFound));
}

// =========================================================================
// Sign-out and profile
// =========================================================================

#[tokio::test]
async fn test_sign_out_clears_user_and_broadcasts_null() {
    let provider = MemoryProvider::new();
    provider.seed_account("ada@example.com", "secret1", None);
    provider
        .sign_in_with_email("ada@example.com", "secret1")
        .await
        .unwrap();
    let mut events = provider.subscribe();

    provider.sign_out();

    assert!(provider.current_user().is_none());
    let event = events.recv().await.unwrap();
    assert_eq!(
        event,
        AuthEvent::StateChanged {
            sender: provider.handle(),
            user: None,
        }
    );
}

#[tokio::test]
async fn test_sign_out_when_signed_out_sends_nothing() {
    let provider = MemoryProvider::new();
    let mut events = provider.subscribe();

    provider.sign_out();

    assert!(events.try_recv().is_err(), "no event expected");
}

#[tokio::test]
async fn test_update_profile_changes_display_name_not_identity() {
    let provider = MemoryProvider::new();
    let user = provider
        .create_user_with_email("ada@example.com", "secret1")
        .await
        .unwrap();

    provider
        .update_profile(ProfileUpdate {
            display_name: Some("Ada".into()),
            photo_url: None,
        })
        .await
        .unwrap();

    let current = provider.current_user().unwrap();
    assert_eq!(current.display_name.as_deref(), Some("Ada"));
    assert!(current.same_user(&user));
}

#[tokio::test]
async fn test_update_profile_signed_out_fails() {
    let provider = MemoryProvider::new();

    let result = provider.update_profile(ProfileUpdate::default()).await;

    assert!(matches!(result, Err(ProviderError::NotSignedIn)));
}

// =========================================================================
// Tokens and hooks
// =========================================================================

#[tokio::test]
async fn test_fetch_token_requires_user() {
    let provider = MemoryProvider::new();

    let result = provider.fetch_token(false).await;

    assert!(matches!(result, Err(ProviderError::NotSignedIn)));
    assert_eq!(provider.token_fetch_count(), 0);
}

#[tokio::test]
async fn test_fetch_token_returns_hex_and_counts() {
    let provider = MemoryProvider::new();
    provider
        .create_user_with_email("ada@example.com", "secret1")
        .await
        .unwrap();

    let token = provider.fetch_token(false).await.unwrap();

    assert_eq!(token.len(), 64);
    assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(provider.token_fetch_count(), 1);
}

#[tokio::test]
async fn test_fetch_token_injected_failure() {
    let provider = MemoryProvider::new();
    provider
        .create_user_with_email("ada@example.com", "secret1")
        .await
        .unwrap();
    provider.fail_token_fetches(Some(AuthErrorCode::NetworkRequestFailed));

    let result = provider.fetch_token(false).await;

    assert_eq!(code_of(result), Some(AuthErrorCode::NetworkRequestFailed));
}

#[tokio::test(start_paused = true)]
async fn test_fetch_token_honors_delay() {
    let provider = MemoryProvider::new();
    provider
        .create_user_with_email("ada@example.com", "secret1")
        .await
        .unwrap();
    provider.set_token_delay(Duration::from_secs(10));

    let early = tokio::time::timeout(Duration::from_secs(5), provider.fetch_token(false)).await;
    assert!(early.is_err(), "fetch should still be pending");

    let late = tokio::time::timeout(Duration::from_secs(20), provider.fetch_token(false)).await;
    assert!(matches!(late, Ok(Ok(_))));
}

#[tokio::test]
async fn test_emit_reaches_subscribers_and_reports_count() {
    let provider = MemoryProvider::new();
    let mut a = provider.subscribe();
    let _b = provider.subscribe();
    let event = AuthEvent::StateChanged {
        sender: provider.handle(),
        user: Some(UserIdentity::new("u1")),
    };

    let delivered = provider.emit(event.clone());

    assert_eq!(delivered, 2);
    assert_eq!(a.recv().await.unwrap(), event);
}

#[tokio::test]
async fn test_dropping_subscription_unsubscribes() {
    let provider = MemoryProvider::new();
    let events = provider.subscribe();
    assert_eq!(provider.subscriber_count(), 1);

    drop(events);

    assert_eq!(provider.subscriber_count(), 0);
}

#[tokio::test]
async fn test_dependency_status_is_reported() {
    let provider = MemoryProvider::new();
    assert_eq!(provider.check_dependencies().await, DependencyStatus::Available);

    provider.set_dependency_status(DependencyStatus::UnavailableMissing);

    assert_eq!(
        provider.check_dependencies().await,
        DependencyStatus::UnavailableMissing
    );
}
