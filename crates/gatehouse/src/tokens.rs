//! Token refresh backed by the identity provider.

use std::sync::Arc;

use gatehouse_identity::ProviderHandle;
use gatehouse_provider::IdentityProvider;
use gatehouse_session::{SessionError, TokenRefresher};

/// Adapts an [`IdentityProvider`] into a [`TokenRefresher`].
///
/// Refreshes are only answered for the provider's own handle; anything
/// else is reported as a failed refresh.
pub struct ProviderTokens<P: IdentityProvider> {
    provider: Arc<P>,
}

impl<P: IdentityProvider> ProviderTokens<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

impl<P: IdentityProvider> TokenRefresher for ProviderTokens<P> {
    async fn refresh_token(
        &self,
        provider: ProviderHandle,
        force_refresh: bool,
    ) -> Result<String, SessionError> {
        if provider != self.provider.handle() {
            return Err(SessionError::RefreshFailed(format!(
                "no provider client for {provider}"
            )));
        }
        self.provider
            .fetch_token(force_refresh)
            .await
            .map_err(|e| SessionError::RefreshFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use gatehouse_identity::AuthErrorCode;
    use gatehouse_provider::MemoryProvider;

    use super::*;

    #[tokio::test]
    async fn test_refresh_token_delegates_to_provider() {
        let provider = Arc::new(MemoryProvider::new());
        provider
            .create_user_with_email("ada@example.com", "secret1")
            .await
            .unwrap();
        let tokens = ProviderTokens::new(Arc::clone(&provider));

        let token = tokens.refresh_token(provider.handle(), false).await.unwrap();

        assert!(!token.is_empty());
        assert_eq!(provider.token_fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_refresh_token_wraps_provider_failure() {
        let provider = Arc::new(MemoryProvider::new());
        provider
            .create_user_with_email("ada@example.com", "secret1")
            .await
            .unwrap();
        provider.fail_token_fetches(Some(AuthErrorCode::NetworkRequestFailed));
        let tokens = ProviderTokens::new(Arc::clone(&provider));

        let err = tokens.refresh_token(provider.handle(), false).await.unwrap_err();

        assert!(matches!(err, SessionError::RefreshFailed(msg) if msg.contains("NetworkRequestFailed")));
    }

    #[tokio::test]
    async fn test_refresh_token_other_handle_fails_without_fetch() {
        let provider = Arc::new(MemoryProvider::new());
        let tokens = ProviderTokens::new(Arc::clone(&provider));

        let result = tokens.refresh_token(ProviderHandle(u64::MAX), false).await;

        assert!(result.is_err());
        assert_eq!(provider.token_fetch_count(), 0);
    }
}
